//! Species Library
//!
//! A directory of species files, one TOML file per species named after its
//! scientific name (`Vulpes vulpes` -> `vulpes_vulpes.toml`), plus an
//! optional `defaults.toml` whose values fill in anything a species file
//! leaves out.

use eco_events::Position;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::components::AttributeTree;
use crate::ecosystem::Ecosystem;
use crate::error::SimError;

pub const DEFAULTS_FILE: &str = "defaults.toml";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("'{species}' has scale {scale} but the grid scale is {grid_scale}")]
    ScaleMismatch {
        species: String,
        scale: f64,
        grid_scale: f64,
    },
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// File name for a species: lower-cased, spaces replaced by underscores.
pub fn species_file_name(name: &str) -> String {
    format!("{}.toml", name.to_lowercase().replace(' ', "_"))
}

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn species_path(&self, name: &str) -> PathBuf {
        self.root.join(species_file_name(name))
    }

    fn read_tree(path: &Path) -> Result<AttributeTree, LibraryError> {
        let content = std::fs::read_to_string(path).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        AttributeTree::from_toml_str(&content).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The library defaults, or an empty tree if there is no defaults file.
    pub fn defaults(&self) -> Result<AttributeTree, LibraryError> {
        let path = self.root.join(DEFAULTS_FILE);
        if path.exists() {
            Self::read_tree(&path)
        } else {
            Ok(AttributeTree::new())
        }
    }

    /// A species' attributes with the library defaults merged in.
    pub fn load_species(&self, name: &str) -> Result<AttributeTree, LibraryError> {
        tracing::debug!("Loading '{}' from '{}'", name, self.root.display());
        let species = Self::read_tree(&self.species_path(name))?;
        Ok(species.merged_over(&self.defaults()?))
    }

    /// Loads a species and spawns one organism of it at `position`.
    ///
    /// The first species with a `Scale` sets the grid scale; a species whose
    /// scale disagrees with it is rejected before anything is placed.
    pub fn load_organism(
        &self,
        name: &str,
        eco: &mut Ecosystem,
        position: Position,
    ) -> Result<u32, LibraryError> {
        let attributes = self.load_species(name)?;
        self.check_scale(name, &attributes, eco)?;
        Ok(eco.spawn(position, attributes)?)
    }

    fn check_scale(
        &self,
        name: &str,
        attributes: &AttributeTree,
        eco: &mut Ecosystem,
    ) -> Result<(), LibraryError> {
        let Ok(scale) = attributes.get_f64("Scale") else {
            tracing::warn!("Species '{}' has no Scale", name);
            return Ok(());
        };
        match eco.grid().scale() {
            None => {
                tracing::info!("Setting grid scale to {}", scale);
                eco.grid_mut().set_scale(scale);
                Ok(())
            }
            Some(grid_scale) if grid_scale != scale => Err(LibraryError::ScaleMismatch {
                species: name.to_string(),
                scale,
                grid_scale,
            }),
            Some(_) => Ok(()),
        }
    }
}
