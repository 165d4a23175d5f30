#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn scene_spins_without_its_images() {
    use std::rc::Rc;

    use skydome::{config::SceneConfig, flow::ImageTestResult};

    use crate::common::test_utils::{MockLoader, SceneCheck, run_scene_check};

    run_scene_check(
        SceneConfig::pier(),
        Rc::new(MockLoader::default()),
        SceneCheck {
            validate: |state, _| {
                if state.animation.frames() < 3 {
                    return Ok(ImageTestResult::Waiting);
                }
                let cube = state.animation.cube();
                let rotation = state
                    .scene
                    .get(cube)
                    .map(|node| node.transform.rotation)
                    .ok_or_else(|| anyhow::anyhow!("cube is missing"))?;
                let expected = 0.001 * state.animation.frames() as f32;
                if (rotation.x - expected).abs() > 1e-5 {
                    return Ok(ImageTestResult::Failed);
                }
                // Failed loads leave the slots empty and the scene in plain colours
                if state.scene.pending_textures().len() != 2 {
                    return Ok(ImageTestResult::Waiting);
                }
                Ok(ImageTestResult::Passed)
            },
        },
    );
}
