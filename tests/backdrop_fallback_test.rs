#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn close_to(pixel: image::Rgba<u8>, expected: [u8; 3]) -> bool {
    pixel.0[..3]
        .iter()
        .zip(expected)
        .all(|(channel, expected)| channel.abs_diff(expected) <= 3)
}

#[test]
#[cfg(feature = "integration-tests")]
fn backdrop_keeps_its_colour_while_loading() {
    use std::rc::Rc;

    use skydome::{config::SceneConfig, flow::ImageTestResult};

    use crate::common::test_utils::{PendingLoader, SceneCheck, centre_pixel, run_scene_check};

    run_scene_check(
        SceneConfig::pier(),
        Rc::new(PendingLoader),
        SceneCheck {
            validate: |state, texture| {
                if state.animation.frames() < 5 {
                    return Ok(ImageTestResult::Waiting);
                }
                assert_eq!(state.scene.pending_textures().len(), 2);
                // White material, not the light gray clear colour
                let pixel = centre_pixel(texture);
                assert!(close_to(pixel, [255, 255, 255]), "expected plain white, got {:?}", pixel);
                Ok(ImageTestResult::Passed)
            },
        },
    );
}
