use skydome::{SceneConfig, run_scene};

fn main() -> anyhow::Result<()> {
    run_scene(SceneConfig::pier())
}
