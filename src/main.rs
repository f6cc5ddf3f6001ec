use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use dicom_explorer::{LoadSource, Orientation, Session, SessionConfig};

#[derive(FromArgs)]
/// Load a DICOM series, explore it and export it as NIfTI.
struct Args {
    /// ZIP archive, single slice file or directory of slices
    #[argh(positional)]
    input: PathBuf,

    /// JSON session configuration
    #[argh(option)]
    config: Option<PathBuf>,

    /// directory receiving images, figures and exports
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// extension of slice files inside archives and directories
    #[argh(option)]
    extension: Option<String>,

    /// lower bound of the visible intensity window
    #[argh(option)]
    threshold_min: Option<f32>,

    /// upper bound of the visible intensity window
    #[argh(option)]
    threshold_max: Option<f32>,

    /// slicing plane: axial, coronal or sagittal, defaults to the configured plane
    #[argh(option)]
    orientation: Option<Orientation>,

    /// slice index along the plane, defaults to the middle slice
    #[argh(option)]
    index: Option<usize>,

    /// write the volumetric figure as JSON
    #[argh(switch)]
    figure: bool,

    /// export the volume to NIfTI
    #[argh(switch)]
    export: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(extension) = args.extension {
        config.slice_extension = extension;
    }

    let mut session = Session::new(config);
    session
        .load(&LoadSource::from_path(&args.input))
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let output_dir = session.config().ensure_output_dir()?.to_path_buf();

    if args.figure || args.threshold_min.is_some() || args.threshold_max.is_some() {
        let default = session
            .threshold()
            .context("Volume has no intensity range to threshold")?;
        let figure = session.set_threshold(
            args.threshold_min.unwrap_or(default.min()),
            args.threshold_max.unwrap_or(default.max()),
        )?;
        if args.figure {
            let path = output_dir.join("volume_figure.json");
            figure.write_json(&path)?;
            log::info!("Wrote {} voxel figure to {}", figure.len(), path.display());
        }
    }

    let orientation = args
        .orientation
        .unwrap_or(session.config().default_orientation);
    let index = match args.index {
        Some(index) => index,
        None => session
            .volume()
            .context("No volume loaded")?
            .default_slice_view(orientation)?
            .index(),
    };
    let image = session.select_slice(orientation, index)?;
    let path = output_dir.join(format!("{orientation}_{index}.png"));
    image.save(&path)?;
    log::info!("Wrote {orientation} slice {index} to {}", path.display());

    if args.export {
        let artifact = session.export()?;
        println!("{}", artifact.path.display());
    }
    Ok(())
}
