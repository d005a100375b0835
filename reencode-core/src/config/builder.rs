// ============================================================================
// reencode-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for WorkerOptions
//
// Fluent construction of the worker policy flags. The CLI maps each boolean
// flag onto one builder call; tests use it to spell out only the flags a
// scenario cares about.

use super::WorkerOptions;

/// Builder for creating WorkerOptions instances.
///
/// # Examples
///
/// ```rust
/// use reencode_core::config::WorkerOptionsBuilder;
///
/// let options = WorkerOptionsBuilder::new()
///     .dry_run(true)
///     .clean_on_error(true)
///     .build();
/// assert!(options.dry_run);
/// assert!(!options.replace);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkerOptionsBuilder {
    options: WorkerOptions,
}

impl WorkerOptionsBuilder {
    /// Creates a builder with every policy disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the run is a dry run.
    pub fn dry_run(mut self, enable: bool) -> Self {
        self.options.dry_run = enable;
        self
    }

    /// Sets whether the original is removed after success.
    pub fn remove(mut self, enable: bool) -> Self {
        self.options.remove = enable;
        self
    }

    /// Sets whether the original is replaced by the output after success.
    pub fn replace(mut self, enable: bool) -> Self {
        self.options.replace = enable;
        self
    }

    /// Sets whether an existing output may be overwritten.
    pub fn overwrite(mut self, enable: bool) -> Self {
        self.options.overwrite = enable;
        self
    }

    /// Sets whether a failed encode's partial output is deleted.
    pub fn clean_on_error(mut self, enable: bool) -> Self {
        self.options.clean_on_error = enable;
        self
    }

    /// Builds the WorkerOptions.
    pub fn build(self) -> WorkerOptions {
        if self.options.replace && self.options.remove {
            log::debug!("Both replace and remove requested; replace takes precedence");
        }
        self.options
    }
}
