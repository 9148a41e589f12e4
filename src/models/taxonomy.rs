//! The canonical twelve-stage research data lifecycle.
//!
//! Stage definitions and the default cycle wiring used when seeding a fresh
//! database or when an imported sheet names a stage without describing it.

use super::{ConnectionKind, Stage};

/// Stage identifiers and definitions, in cycle order.
pub const STAGE_DEFINITIONS: [(&str, &str); 12] = [
    (
        "CONCEPTUALISE",
        "To formulate the initial research idea or hypothesis, and define the scope of the research project and the data component/requirements of that project.",
    ),
    (
        "PLAN",
        "To establish a structured strategic framework for management of the research project, outlining aims, objectives, methodologies, and resources required for data collection, management and analysis. Data management plans (DMP) should be established for this phase of the lifecycle.",
    ),
    (
        "FUND",
        "To identify and acquire financial resources to support the research project, including data collection, management, analysis, sharing, publishing and preservation.",
    ),
    (
        "COLLECT",
        "To use predefined procedures, methodologies and instruments to acquire and store data that is reliable, fit for purpose and of sufficient quality to test the research hypothesis.",
    ),
    (
        "PROCESS",
        "To make new and existing data analysis-ready. This may involve standardised pre-processing, cleaning, reformatting, structuring, filtering, and performing quality control checks on data. It may also involve the creation and definition of metadata for use during analysis, such as acquiring provenance from instruments and tools used during data collection.",
    ),
    (
        "ANALYSE",
        "To derive insights, knowledge, and understanding from processed data. Data analysis involves iterative exploration and interpretation of experimental or computational results, often utilising mathematical models and formulae to investigate relationships between experimental variables. Distinct data analysis techniques and methodologies are applied according to the data type (quantitative vs qualitative).",
    ),
    (
        "STORE",
        "To record data using technological media appropriate for processing and analysis whilst maintaining data integrity and security.",
    ),
    (
        "PUBLISH",
        "To release research data in published form for use by others with appropriate metadata for citation (including a unique persistent identifier) based on FAIR principles.",
    ),
    (
        "PRESERVE",
        "To ensure the safety, integrity, and accessibility of data for as long as necessary so that data is as FAIR as possible. Data preservation is more than data storage and backup, since data can be stored and backed up without being preserved. Preservation should include curation activities such as data cleaning, validation, assigning preservation metadata, assigning representation information, and ensuring acceptable data structures and file formats. At a minimum, data and associated metadata should be published in a trustworthy digital repository and clearly cited in the accompanying journal article unless this is not possible (e.g. due to the privacy or safety concerns).",
    ),
    (
        "SHARE",
        "To make data available and accessible to humans and/or machines. Data may be shared with project collaborators or published to share it with the wider research community and society at large. Data sharing is not limited to open data or public data, and can be done during various stages of the research data lifecycle. At a minimum, data and associated metadata should be published in a trustworthy digital repository and clearly cited in the accompanying journal article.",
    ),
    (
        "ACCESS",
        "To control and manage data access by designated users and reusers. This may be in the form of publicly available published information. Necessary access control and authentication methods are applied.",
    ),
    (
        "TRANSFORM",
        "To create new data from the original, for example: (i) by migration into a different format; (ii) by creating a subset, by selection or query, to create newly derived results, perhaps for publication; or, iii) combining or appending with other data",
    ),
];

/// Shortcut edges between adjacent stages, by 1-based stage position.
const ALTERNATIVE_PATHS: [(usize, usize); 3] = [(3, 4), (4, 5), (5, 6)];

/// The twelve canonical stages with positions 1..=12.
pub fn canonical_stages() -> Vec<Stage> {
    STAGE_DEFINITIONS
        .iter()
        .enumerate()
        .map(|(i, (name, desc))| Stage::new(name, *desc, i as i64 + 1))
        .collect()
}

/// Look up the canonical definition for a stage identifier (case-insensitive).
pub fn stage_definition(name: &str) -> Option<&'static str> {
    let name = name.trim();
    STAGE_DEFINITIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, d)| *d)
}

/// Canonical position for a stage identifier, if it is one of the twelve.
pub fn stage_position(name: &str) -> Option<i64> {
    let name = name.trim();
    STAGE_DEFINITIONS
        .iter()
        .position(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|i| i as i64 + 1)
}

/// Default cycle wiring as `(start, end, kind)` triples.
///
/// Twelve `normal` edges around the ring (TRANSFORM closes back to
/// CONCEPTUALISE) followed by the `alternative` shortcuts.
pub fn default_connections() -> Vec<(&'static str, &'static str, ConnectionKind)> {
    let n = STAGE_DEFINITIONS.len();
    let ring = (0..n).map(|i| {
        (
            STAGE_DEFINITIONS[i].0,
            STAGE_DEFINITIONS[(i + 1) % n].0,
            ConnectionKind::Normal,
        )
    });
    let shortcuts = ALTERNATIVE_PATHS.iter().map(|&(from, to)| {
        (
            STAGE_DEFINITIONS[from - 1].0,
            STAGE_DEFINITIONS[to - 1].0,
            ConnectionKind::Alternative,
        )
    });
    ring.chain(shortcuts).collect()
}
