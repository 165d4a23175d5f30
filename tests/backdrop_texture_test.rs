#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
const BACKDROP_RED: [u8; 4] = [200, 40, 40, 255];

#[cfg(feature = "integration-tests")]
fn close_to(pixel: image::Rgba<u8>, expected: [u8; 3]) -> bool {
    pixel.0[..3]
        .iter()
        .zip(expected)
        .all(|(channel, expected)| channel.abs_diff(expected) <= 3)
}

#[test]
#[cfg(feature = "integration-tests")]
fn backdrop_shows_its_loaded_image() {
    use std::rc::Rc;

    use skydome::{config::SceneConfig, flow::ImageTestResult};

    use crate::common::test_utils::{
        MockLoader, SceneCheck, centre_pixel, run_scene_check, solid_image,
    };

    let loader = MockLoader::default()
        .with_image("images/pier.jpg", solid_image(16, 8, BACKDROP_RED))
        .with_image("images/large-og.jpg", solid_image(2, 2, [0, 0, 255, 255]));

    run_scene_check(
        SceneConfig::pier(),
        Rc::new(loader),
        SceneCheck {
            validate: |state, texture| {
                let frames = state.animation.frames();
                let arrived = state
                    .scene
                    .textures()
                    .any(|(_, entry)| entry.path() == "images/pier.jpg" && entry.is_resolved());
                if !arrived {
                    return match frames {
                        0..60 => Ok(ImageTestResult::Waiting),
                        _ => Err(anyhow::anyhow!("backdrop image never arrived")),
                    };
                }
                // Give the upload a few frames to reach the material
                if frames < 5 {
                    return Ok(ImageTestResult::Waiting);
                }
                let pixel = centre_pixel(texture);
                let [r, g, b, _] = BACKDROP_RED;
                assert!(close_to(pixel, [r, g, b]), "expected the backdrop image, got {:?}", pixel);
                Ok(ImageTestResult::Passed)
            },
        },
    );
}
