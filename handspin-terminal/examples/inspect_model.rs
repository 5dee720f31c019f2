/// Example: Print how a model file will be normalized for display
///
/// Usage: cargo run --example inspect_model -- path/to/model.glb

use std::env;

use handspin_core::{FileAssetSource, ModelSlot, NormalizeOptions};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let Some(path) = args.get(1) else {
        eprintln!("Usage: {} <model-file>", args[0]);
        std::process::exit(2);
    };

    let mut source = FileAssetSource::new();
    let mut slot = ModelSlot::new(NormalizeOptions::default());
    let model = slot.load(path, &mut source)?;

    let size = model.bounds.size();
    println!("Model:         {}", model.source_url);
    println!("Nodes:         {}", model.scene.node_count());
    println!("Surfaces:      {}", model.scene.surface_count());
    println!(
        "Bounds size:   {:.4} x {:.4} x {:.4}",
        size.x, size.y, size.z
    );
    println!(
        "Center:        ({:.4}, {:.4}, {:.4})",
        model.center.x, model.center.y, model.center.z
    );
    println!("Display scale: {:.4}", model.display_scale);

    for material in model.scene.materials() {
        println!(
            "Material {:?}: opacity {}, transparent {}, side {:?}, ready {}",
            material.name,
            material.opacity,
            material.transparent,
            material.side,
            material.is_display_ready()
        );
    }

    Ok(())
}
