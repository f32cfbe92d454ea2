//! Eyelid control-point tables.
//!
//! The default table is embedded at compile time from
//! `contrib/lids/eyelid.toml`. A replacement with the same schema can be
//! loaded at startup; every table is validated once on load so per-frame
//! curve building never meets an unmapped or out-of-range index.

use crate::spline::{self, ControlPointSpec, CurveError};
use crate::symmetry::SymmetryTable;
use crate::types::{ClosedCurve, Point, LANDMARK_COUNT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Compile-time embedded eyelid table.
const EYELID_TOML: &str = include_str!("../../../contrib/lids/eyelid.toml");

#[derive(Error, Debug)]
pub enum TableError {
    #[error("failed to read control table {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bad control table TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid control table: {0}")]
    Invalid(#[from] CurveError),
}

/// On-disk schema of a control table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LidTableFile {
    pub name: String,
    pub points: Vec<ControlPointSpec>,
}

/// A validated control table and its precomputed mirror image.
#[derive(Debug, Clone, PartialEq)]
pub struct LidTable {
    name: String,
    direct: Vec<ControlPointSpec>,
    mirrored: Vec<ControlPointSpec>,
}

impl LidTable {
    /// The built-in eyelid table mirrored through the iBUG 68 symmetry.
    pub fn embedded() -> Result<Self, TableError> {
        Self::from_toml_str(EYELID_TOML, &SymmetryTable::ibug68())
    }

    /// Load a table from a TOML file.
    pub fn load(path: &Path, symmetry: &SymmetryTable) -> Result<Self, TableError> {
        let src = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_toml_str(&src, symmetry)?;
        tracing::info!(
            path = %path.display(),
            name = %table.name,
            points = table.direct.len(),
            "loaded control table"
        );
        Ok(table)
    }

    pub fn from_toml_str(src: &str, symmetry: &SymmetryTable) -> Result<Self, TableError> {
        let file: LidTableFile = toml::from_str(src)?;
        Ok(Self::from_specs(file.name, file.points, symmetry)?)
    }

    /// Validate `specs` and precompute their mirror image.
    ///
    /// Rejects indices outside the landmark set, factors outside `[0, 1]`,
    /// empty or odd-length tables, and indices the symmetry table cannot map
    /// back onto themselves.
    pub fn from_specs(
        name: impl Into<String>,
        specs: Vec<ControlPointSpec>,
        symmetry: &SymmetryTable,
    ) -> Result<Self, CurveError> {
        for (position, spec) in specs.iter().enumerate() {
            spec.validate(position, LANDMARK_COUNT)?;
        }
        if specs.is_empty() || specs.len() % 2 != 0 {
            return Err(CurveError::InvalidCurveTopology { len: specs.len() });
        }
        let mirrored = spline::mirror(&specs, symmetry)?;
        if let Some(index) = specs
            .iter()
            .flat_map(|spec| [spec.start, spec.end])
            .find(|&index| !symmetry.is_involutive_on([index]))
        {
            return Err(CurveError::NonInvolutiveMirror(index));
        }

        Ok(Self {
            name: name.into(),
            direct: specs,
            mirrored,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Specs as authored.
    pub fn direct(&self) -> &[ControlPointSpec] {
        &self.direct
    }

    /// Specs mapped onto the other side of the face.
    pub fn mirrored(&self) -> &[ControlPointSpec] {
        &self.mirrored
    }

    /// Build `(mirrored, direct)` closed curves for one landmark set.
    pub fn curves(&self, landmarks: &[Point]) -> Result<(ClosedCurve, ClosedCurve), CurveError> {
        let mirrored = spline::build_curve(landmarks, &self.mirrored)?;
        let direct = spline::build_curve(landmarks, &self.direct)?;
        Ok((mirrored, direct))
    }
}
