//! Render a canvas snapshot to a PNG with the software backend.
//!
//! Image assets are resolved relative to the snapshot's directory.
//!
//! Run with: cargo run --example render_canvas -- canvas.json [out.png]

use std::path::Path;

use blink::prelude::*;

fn main() -> blink::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: render_canvas <canvas.json> [out.png]");
        std::process::exit(2);
    };
    let canvas = Canvas::from_json(&std::fs::read_to_string(&input)?)?;
    let asset_root = Path::new(&input)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut ctx = RenderContext::new(SoftwareBackend::new());
    match pollster::block_on(ctx.update(&canvas, &FsLoader::new(asset_root))) {
        RenderOutcome::Rendered(stats) => log::info!("Rendered: {stats:?}"),
        other => {
            eprintln!("nothing rendered: {other:?}");
            return Ok(());
        }
    }

    let Some(texture) = ctx.export()? else {
        eprintln!("canvas has no config, cannot export");
        return Ok(());
    };
    let output = args.next().unwrap_or_else(|| {
        let name = ctx.export_name().filter(|n| !n.is_empty()).unwrap_or("canvas");
        format!("{name}.png")
    });
    std::fs::write(&output, ctx.backend().encode_png(texture)?)?;
    println!("wrote {output}");
    Ok(())
}
