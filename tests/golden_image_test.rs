#[cfg(feature = "integration-tests")]
use crate::common::test_utils::TestRender;
#[cfg(feature = "integration-tests")]
use skydome::scene::Colour;

#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use skydome::{context::Context, flow::ImageTestResult};

    golden_image_test!(TestRender::new(
        &|ctx: &mut Context| {
            ctx.clear_colour = wgpu::Color::WHITE;
        },
        &|_, state: &mut FrameCounter, texture| {
            if state.frame() > 0 {
                let desired_pixel = image::Rgba([255, 255, 255, 255]);
                for pixel in texture.pixels() {
                    assert_eq!(*pixel, desired_pixel);
                }
                Ok(ImageTestResult::Passed)
            } else {
                Ok(ImageTestResult::Waiting)
            }
        },
    ));
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_clear_to_the_scene_background() {
    use skydome::{context::Context, flow::ImageTestResult};

    golden_image_test!(TestRender::new(
        &|ctx: &mut Context| {
            ctx.clear_colour = Colour::LIGHT_GRAY.into();
        },
        &|_, state: &mut FrameCounter, texture| {
            if state.frame() > 0 {
                // The surface re-encodes the linear clear colour as sRGB
                let expected = 0xd3u8;
                for pixel in texture.pixels() {
                    for channel in &pixel.0[..3] {
                        assert!(
                            channel.abs_diff(expected) <= 1,
                            "expected light gray, got {:?}",
                            pixel
                        );
                    }
                }
                Ok(ImageTestResult::Passed)
            } else {
                Ok(ImageTestResult::Waiting)
            }
        },
    ));
}
