use std::path::Path;

use agenda_engine::invite::DEFAULT_PLACEHOLDER;
use agenda_engine::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use agenda_engine::{PageRequest, SortOrder, ViewOptions};
use anyhow::{bail, Result};
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub view: ViewConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// Description placed on every item an invite viewer sees.
    pub placeholder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Settings {
    /// Defaults, then `agenda.toml` (or `config_file`), then `AGENDA_*` variables.
    ///
    /// Nested keys use a double underscore: `AGENDA_VIEW__PLACEHOLDER`.
    ///
    /// ## Errors
    /// Returns an error if an explicit `config_file` is missing, or building
    /// or deserializing the configuration fails.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("agenda").required(false),
        };

        Ok(Config::builder()
            .set_default("logging.level", "info")?
            .set_default("view.placeholder", DEFAULT_PLACEHOLDER)?
            .set_default("pagination.default_page_size", DEFAULT_PAGE_SIZE as u64)?
            .set_default("pagination.max_page_size", MAX_PAGE_SIZE as u64)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("AGENDA")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            placeholder: self.view.placeholder.clone(),
        }
    }

    /// Fill in the configured page size and enforce the configured ceiling.
    ///
    /// ## Errors
    /// Returns an error when `page_size` exceeds `pagination.max_page_size`.
    pub fn page_request(
        &self,
        page: usize,
        page_size: Option<usize>,
        order: SortOrder,
    ) -> Result<PageRequest> {
        let page_size = page_size.unwrap_or(self.pagination.default_page_size);
        if page_size > self.pagination.max_page_size {
            bail!(
                "page size {page_size} exceeds the configured maximum of {}",
                self.pagination.max_page_size
            );
        }
        Ok(PageRequest::new(page, page_size, order))
    }
}
