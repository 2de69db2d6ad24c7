//! One-shot queries against the comparison backend.

use crate::{BackendArgs, OutputFormat};
use cmx_core::{PhysicalVariable, RegionBoundsTable};
use cmx_session::{Action, Driver, MapView, Marker, Outcome, Session, VisualizationMode};
use log::{info, warn};
use serde::Serialize;
use std::io::Write;

/// Everything a `render` run selects, top of the cascade first.
#[derive(Debug, Clone)]
pub struct Selection {
    pub variable: PhysicalVariable,
    pub metric: String,
    pub region: Option<String>,
    pub mode: VisualizationMode,
    pub filter: Option<String>,
}

pub async fn run_regions(backend: &BackendArgs) -> anyhow::Result<()> {
    let client = backend.client()?;
    let regions = client.list_regions().await?;
    info!("{} regions", regions.len());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for region in regions {
        writeln!(out, "{}", region)?;
    }
    Ok(())
}

pub async fn run_metrics(backend: &BackendArgs, variable: PhysicalVariable) -> anyhow::Result<()> {
    let client = backend.client()?;
    let metrics = client.list_metrics(variable, None).await?;
    info!("{} metrics for {}", metrics.len(), variable);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for metric in metrics {
        writeln!(out, "{}", metric)?;
    }
    Ok(())
}

/// Walk the selection cascade one level at a time, waiting for each level's
/// options to load before choosing the next.
pub async fn run_render(
    backend: &BackendArgs,
    selection: &Selection,
    format: OutputFormat,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let client = backend.client()?;
    let session = Session::new(RegionBoundsTable::builtin()?);
    let mut driver = Driver::new(client, session, backend.config().timeout);

    driver.start();
    driver.dispatch(Action::SetVariable(Some(selection.variable)))?;
    report(driver.settle().await);

    driver.dispatch(Action::SetMetric(Some(selection.metric.clone())))?;
    report(driver.settle().await);

    if let Some(region) = &selection.region {
        driver.dispatch(Action::SetRegion(Some(region.clone())))?;
        report(driver.settle().await);
    }

    driver.dispatch(Action::SetMode(selection.mode))?;
    if let Some(filter) = &selection.filter {
        match selection.mode {
            VisualizationMode::GcmFilter => driver.dispatch(Action::SetGcmFilter(Some(filter.clone())))?,
            VisualizationMode::RcmFilter => driver.dispatch(Action::SetRcmFilter(Some(filter.clone())))?,
            other => anyhow::bail!("--filter needs gcm_filter or rcm_filter mode, not {}", other),
        };
    }

    let view = driver.render();
    info!(
        "Rendered {} markers in {} mode (generation {})",
        view.markers.len(),
        view.mode,
        view.generation
    );
    write_view(&view, format, output)
}

/// Log failed fetches; the session has already cleared their slices.
pub fn report(outcomes: Vec<Outcome>) {
    for outcome in outcomes {
        if let Outcome::Cleared { slice, error } = outcome {
            warn!("{:?} unavailable: {}", slice, error);
        }
    }
}

/// Flat CSV form of a [`Marker`].
#[derive(Debug, Serialize)]
pub struct MarkerRow<'a> {
    pub region: &'a str,
    pub gridpoint: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
    pub tooltip: String,
}

impl<'a> From<&'a Marker> for MarkerRow<'a> {
    fn from(marker: &'a Marker) -> Self {
        Self {
            region: marker.region.as_deref().unwrap_or(""),
            gridpoint: &marker.gridpoint,
            latitude: marker.latitude,
            longitude: marker.longitude,
            color: marker.color.to_string(),
            tooltip: marker.tooltip.join("; "),
        }
    }
}

pub fn write_markers_csv<W: Write>(markers: &[Marker], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for marker in markers {
        wtr.serialize(MarkerRow::from(marker))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_view(view: &MapView, format: OutputFormat, output: Option<&str>) -> anyhow::Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    match format {
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, view)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => write_markers_csv(&view.markers, writer)?,
    }
    if let Some(path) = output {
        info!("Wrote {} markers to {}", view.markers.len(), path);
    }
    Ok(())
}
