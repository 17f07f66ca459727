//! Command implementations behind the `sharpdom` binary.
//!
//! Each function reads its input files, runs one model operation and
//! returns the response the binary prints. Argument parsing and process
//! exit codes stay in the binary.

use std::path::Path;

use tracing::info;

use sharpdom_core::error::DomError;

use crate::build::{build, rebuild_with};
use crate::config::DomConfig;
use crate::factory::FactoryRegistry;
use crate::node::NodeId;
use crate::output::{CompareResponse, FormatResponse, OutlineNode, OutlineResponse, RoundtripResponse};

fn read_source(path: &Path) -> Result<String, DomError> {
    if !path.is_file() {
        return Err(DomError::file_not_found(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn label(path: &Path) -> String {
    path.display().to_string()
}

/// Build both files and compare them for equivalent intent.
pub fn run_compare(
    left: &Path,
    right: &Path,
    include_annotations: bool,
) -> Result<CompareResponse, DomError> {
    let left_dom = build(&read_source(left)?)?;
    let right_dom = build(&read_source(right)?)?;
    let same = left_dom.same_intent(&right_dom, include_annotations);
    info!(same_intent = same, include_annotations, "compared models");
    Ok(CompareResponse::new(label(left), label(right), include_annotations, same))
}

/// Build, rebuild, and check that the rebuilt text means the same thing.
pub fn run_roundtrip(file: &Path, config: &DomConfig) -> Result<RoundtripResponse, DomError> {
    let dom = build(&read_source(file)?)?;
    let registry = FactoryRegistry::with_defaults();
    let text = rebuild_with(&dom, dom.root_id(), &registry, &config.format_options())?;
    let rebuilt = build(&text)?;
    let same = dom.same_intent(&rebuilt, config.include_annotations.value);
    let degraded = (0..dom.len())
        .filter_map(|index| dom.get(NodeId(index as u32)))
        .filter(|node| node.is_degraded())
        .count();
    info!(same_intent = same, degraded, "round trip");
    Ok(RoundtripResponse::new(
        label(file),
        same,
        dom.has_syntax_errors(),
        degraded,
        text,
    ))
}

/// Declarations of a file as a tree.
pub fn run_outline(file: &Path) -> Result<OutlineResponse, DomError> {
    let dom = build(&read_source(file)?)?;
    Ok(OutlineResponse::new(
        label(file),
        dom.has_syntax_errors(),
        OutlineNode::children_of(dom.root()),
    ))
}

/// The file regenerated from its model with the configured layout.
pub fn run_format(file: &Path, config: &DomConfig) -> Result<FormatResponse, DomError> {
    let dom = build(&read_source(file)?)?;
    let registry = FactoryRegistry::with_defaults();
    let text = rebuild_with(&dom, dom.root_id(), &registry, &config.format_options())?;
    Ok(FormatResponse::new(label(file), text))
}
