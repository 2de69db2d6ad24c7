//! Interactive exploration loop.
//!
//! Reads selection commands from stdin while backend fetches run in the
//! background. The view is re-rendered after every user action and every
//! applied response, and the viewport is only reported when it moves.

use crate::BackendArgs;
use cmx_core::{ModelAxis, PhysicalVariable, RegionBoundsTable};
use cmx_data::viewport::MapViewSync;
use cmx_session::{Action, Backend, Driver, Outcome, Session, VisualizationMode};
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  variable <ppt|tas|none>   choose the physical variable
  metric <name|none>        choose a metric from the offered list
  region <name|none>        choose a region from the offered list
  mode <mode>               interaction, best_gcm, best_rcm, gcm_filter, rcm_filter
  filter <model|none>       model to highlight in the current filter mode
  options                   list selectable values
  show                      print the current map view
  state                     print the current selection
  quit";

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Variable(Option<PhysicalVariable>),
    Metric(Option<String>),
    Region(Option<String>),
    Mode(VisualizationMode),
    Filter(Option<String>),
    Options,
    Show,
    State,
    Help,
    Quit,
}

fn optional(arg: &str) -> Option<String> {
    match arg {
        "" | "none" | "-" => None,
        value => Some(value.to_string()),
    }
}

/// Parse a line of input. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let input = match word.to_lowercase().as_str() {
        "variable" | "var" => match optional(arg) {
            Some(value) => Input::Variable(Some(value.parse()?)),
            None => Input::Variable(None),
        },
        "metric" => Input::Metric(optional(arg)),
        "region" => Input::Region(optional(arg)),
        "mode" => Input::Mode(arg.parse()?),
        "filter" => Input::Filter(optional(arg)),
        "options" => Input::Options,
        "show" => Input::Show,
        "state" => Input::State,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command '{}' (try help)", other)),
    };
    Ok(Some(input))
}

fn to_action(input: Input, session: &Session) -> Result<Action, String> {
    let action = match input {
        Input::Variable(value) => Action::SetVariable(value),
        Input::Metric(value) => Action::SetMetric(value),
        Input::Region(value) => Action::SetRegion(value),
        Input::Mode(mode) => Action::SetMode(mode),
        Input::Filter(value) => match session.state().visualization_mode().axis() {
            Some(ModelAxis::Gcm) if session.state().visualization_mode().is_filter() => {
                Action::SetGcmFilter(value)
            }
            Some(ModelAxis::Rcm) if session.state().visualization_mode().is_filter() => {
                Action::SetRcmFilter(value)
            }
            _ => return Err("filter needs gcm_filter or rcm_filter mode".to_string()),
        },
        other => return Err(format!("{:?} is not a selection", other)),
    };
    Ok(action)
}

fn print_state(session: &Session) {
    let state = session.state();
    println!(
        "variable={} metric={} region={} mode={} gcm_filter={} rcm_filter={} generation={}",
        state.variable().map_or("-", |v| v.as_str()),
        state.metric().unwrap_or("-"),
        state.region().unwrap_or("-"),
        state.visualization_mode(),
        state.gcm_filter_value().unwrap_or("-"),
        state.rcm_filter_value().unwrap_or("-"),
        state.generation()
    );
}

fn print_options(session: &Session) {
    let state = session.state();
    println!("metrics: {}", state.available_metrics().join(", "));
    println!("regions: {}", state.available_regions().join(", "));
    println!("gcm filter: {}", session.filter_options(ModelAxis::Gcm).join(", "));
    println!("rcm filter: {}", session.filter_options(ModelAxis::Rcm).join(", "));
}

fn print_view(session: &Session) {
    let view = session.render();
    println!("{} markers ({} mode)", view.markers.len(), view.mode);
    for entry in &view.legend {
        println!("  {:<24} {}", entry.label, entry.color);
    }
}

/// Re-render and report a viewport move, if any.
fn sync_viewport<B: Backend + Clone + 'static>(driver: &Driver<B>, sync: &mut MapViewSync) {
    let view = driver.render();
    if sync.update(view.viewport) {
        if let Some(b) = sync.current() {
            println!(
                "viewport: {:.2},{:.2} .. {:.2},{:.2}",
                b.south, b.west, b.north, b.east
            );
        }
    }
}

pub async fn run_explore(backend: &BackendArgs) -> anyhow::Result<()> {
    let client = backend.client()?;
    let session = Session::new(RegionBoundsTable::builtin()?);
    let mut driver = Driver::new(client, session, backend.config().timeout);
    let mut sync = MapViewSync::new(None);

    info!("Exploring {}", backend.api_url);
    println!("{}", HELP);
    driver.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = match parse_line(&line) {
                    Ok(Some(input)) => input,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("error: {}", e);
                        continue;
                    }
                };
                match input {
                    Input::Quit => break,
                    Input::Help => println!("{}", HELP),
                    Input::State => print_state(driver.session()),
                    Input::Options => print_options(driver.session()),
                    Input::Show => print_view(driver.session()),
                    selection => match to_action(selection, driver.session()) {
                        Ok(action) => match driver.dispatch(action) {
                            Ok(fetches) => {
                                debug!("{} fetches in flight", driver.pending());
                                if fetches > 0 {
                                    println!("loading...");
                                }
                                sync_viewport(&driver, &mut sync);
                            }
                            Err(e) => println!("error: {}", e),
                        },
                        Err(e) => println!("error: {}", e),
                    },
                }
            }
            Some(outcome) = driver.next_outcome(), if driver.pending() > 0 => {
                match outcome {
                    Outcome::Applied(slice) => println!("loaded {:?}", slice),
                    Outcome::Cleared { slice, error } => println!("{:?} unavailable: {}", slice, error),
                    Outcome::Discarded { .. } => {}
                }
                sync_viewport(&driver, &mut sync);
            }
        }
    }
    Ok(())
}
