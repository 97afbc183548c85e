//! Import orchestration
//!
//! The importer sequences parse → validate → diff → conflict gate →
//! batch apply. `preview` runs the first three phases and returns the
//! change-set; `import` continues into application unless `dry_run` is
//! set or the conflict gate blocks.
//!
//! `import` never returns `Err`: every collaborator failure is caught at
//! this boundary and converted into fields on the returned
//! [`ImportResult`]. Partial progress is reported honestly — `applied`
//! reflects whatever portion succeeded even when `success` is false.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use onto_backend::{
    BatchOperation, BatchResult, ConflictStrategy, EntityStore, TemplateParser, apply_batch,
};
use onto_diff::{ChangeSet, ConflictPolicy, diff};
use onto_model::{EntityKind, ExistingOntology};

use crate::error::{Error, Result};
use crate::progress::{ImportPhase, ProgressFn, ProgressUpdate};

/// How many entities of each kind an import durably applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedCounts {
    pub classes: usize,
    pub properties: usize,
}

impl AppliedCounts {
    pub fn total(&self) -> usize {
        self.classes + self.properties
    }
}

/// Options accepted by [`Importer::import`]
pub struct ImportOptions {
    /// Run the preview phases only; skip application
    pub dry_run: bool,
    pub conflict_strategy: ConflictStrategy,
    /// Set false to skip the validating phase (trusted input)
    pub validate: bool,
    pub on_progress: Option<Arc<ProgressFn>>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self {
            dry_run: false,
            conflict_strategy: ConflictStrategy::Ask,
            validate: true,
            on_progress: None,
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = strategy;
        self
    }

    pub fn with_progress(mut self, callback: Arc<ProgressFn>) -> Self {
        self.on_progress = Some(callback);
        self
    }
}

/// Outcome of an import
#[derive(Debug)]
pub struct ImportResult {
    /// False when parsing/validation failed, the conflict gate blocked,
    /// or at least one apply operation failed
    pub success: bool,
    pub preview: Option<ChangeSet>,
    /// What was durably applied, regardless of overall success
    pub applied: AppliedCounts,
    pub errors: Vec<Error>,
    pub duration: Duration,
    pub dry_run: bool,
}

/// Orchestrates template imports against the entity store
pub struct Importer {
    parser: Arc<dyn TemplateParser>,
    store: Arc<dyn EntityStore>,
    policy: ConflictPolicy,
}

impl Importer {
    pub fn new(parser: Arc<dyn TemplateParser>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            parser,
            store,
            policy: ConflictPolicy::default(),
        }
    }

    /// Replace the default conflict-classification policy
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run parse → validate → diff and return the change-set
    pub async fn preview(&self, content: &str) -> Result<ChangeSet> {
        self.run_preview(content, true, None).await
    }

    /// Run the full pipeline
    ///
    /// All failure modes resolve to the returned result; this method
    /// does not propagate collaborator errors.
    pub async fn import(&self, content: &str, options: ImportOptions) -> ImportResult {
        let started = Instant::now();
        let progress = options.on_progress.as_deref();
        let mut result = ImportResult {
            success: false,
            preview: None,
            applied: AppliedCounts::default(),
            errors: Vec::new(),
            duration: Duration::ZERO,
            dry_run: options.dry_run,
        };

        let preview = match self.run_preview(content, options.validate, progress).await {
            Ok(preview) => preview,
            Err(err) => {
                warn!(error = %err, "import aborted before apply");
                result.errors.push(err);
                result.duration = started.elapsed();
                return result;
            }
        };

        // Conflict gate: under Ask, nothing is applied while conflicts exist
        if options.conflict_strategy == ConflictStrategy::Ask && preview.has_conflicts() {
            let count = preview.conflicts.len();
            info!(count, "import blocked by unresolved conflicts");
            result.errors.push(Error::UnresolvedConflicts { count });
            result.preview = Some(preview);
            result.duration = started.elapsed();
            return result;
        }

        if options.dry_run {
            result.success = true;
            result.preview = Some(preview);
            result.duration = started.elapsed();
            return result;
        }

        let operations = build_operations(&preview, options.conflict_strategy);
        emit(
            progress,
            ImportPhase::Importing,
            0,
            operations.len(),
            format!("applying {} operation(s)", operations.len()),
        );

        let batch = {
            let adapter = progress.map(|cb| {
                move |p: onto_backend::BatchProgress| {
                    cb(ProgressUpdate {
                        phase: ImportPhase::Importing,
                        current: p.current,
                        total: p.total,
                        message: format!("{} of {} operations", p.current, p.total),
                    });
                }
            });
            let adapter_ref: Option<&(dyn Fn(onto_backend::BatchProgress) + Send + Sync)> =
                adapter
                    .as_ref()
                    .map(|a| a as &(dyn Fn(onto_backend::BatchProgress) + Send + Sync + '_));
            apply_batch(self.store.as_ref(), &operations, adapter_ref).await
        };

        result.applied = count_applied(&operations, &batch);
        for err in &batch.errors {
            result.errors.push(Error::Apply {
                index: err.index,
                item: err.item.clone(),
                message: err.message.clone(),
            });
        }
        result.success = batch.is_success();
        result.preview = Some(preview);
        result.duration = started.elapsed();
        info!(
            success = result.success,
            classes = result.applied.classes,
            properties = result.applied.properties,
            failed = batch.failed,
            "import finished"
        );
        result
    }

    async fn run_preview(
        &self,
        content: &str,
        validate: bool,
        progress: Option<&ProgressFn>,
    ) -> Result<ChangeSet> {
        emit(progress, ImportPhase::Parsing, 1, 4, "parsing template");
        let template = self
            .parser
            .parse(content)
            .map_err(|e| Error::import_failed(e.to_string()))?;

        emit(progress, ImportPhase::Validating, 2, 4, "validating definitions");
        if validate {
            self.parser
                .validate(&template)
                .map_err(|e| Error::import_failed(e.to_string()))?;
        }

        emit(progress, ImportPhase::Comparing, 3, 4, "comparing against store");
        let snapshot = self.snapshot().await?;
        let preview = diff(&template, &snapshot, &self.policy);
        debug!(
            new = preview.summary.new_count,
            updated = preview.summary.updated_count,
            conflicts = preview.summary.conflict_count,
            "preview computed"
        );
        Ok(preview)
    }

    async fn snapshot(&self) -> Result<ExistingOntology> {
        let properties = self.store.list_properties().await?;
        let classes = self.store.list_classes().await?;
        Ok(ExistingOntology::new(properties, classes))
    }
}

fn emit(
    progress: Option<&ProgressFn>,
    phase: ImportPhase,
    current: usize,
    total: usize,
    message: impl Into<String>,
) {
    if let Some(cb) = progress {
        cb(ProgressUpdate {
            phase,
            current,
            total,
            message: message.into(),
        });
    }
}

/// Order of application: new properties, new classes, updated properties,
/// updated classes. Properties precede the classes that may reference
/// them; within each group the change-set's list order is kept.
fn build_operations(preview: &ChangeSet, strategy: ConflictStrategy) -> Vec<BatchOperation> {
    let conflicted: BTreeSet<(EntityKind, &str)> = preview
        .conflicts
        .iter()
        .map(|c| (c.kind, c.name.as_str()))
        .collect();
    let skip = |kind: EntityKind, name: &str| {
        strategy == ConflictStrategy::Skip && conflicted.contains(&(kind, name))
    };

    let mut operations = Vec::new();
    for prop in &preview.new_properties {
        operations.push(BatchOperation::CreateProperty(prop.clone()));
    }
    for class in &preview.new_classes {
        operations.push(BatchOperation::CreateClass(class.clone()));
    }
    for update in &preview.updated_properties {
        if skip(EntityKind::Property, &update.name) {
            continue;
        }
        operations.push(BatchOperation::UpdateProperty(update.after.clone()));
    }
    for update in &preview.updated_classes {
        if skip(EntityKind::Class, &update.name) {
            continue;
        }
        operations.push(BatchOperation::UpdateClass(update.after.clone()));
    }
    operations
}

fn count_applied(operations: &[BatchOperation], batch: &BatchResult) -> AppliedCounts {
    let failed: BTreeSet<usize> = batch.errors.iter().map(|e| e.index).collect();
    let mut counts = AppliedCounts::default();
    for (index, op) in operations.iter().enumerate() {
        if failed.contains(&index) {
            continue;
        }
        match op {
            BatchOperation::CreateProperty(_)
            | BatchOperation::UpdateProperty(_)
            | BatchOperation::DeleteProperty(_) => counts.properties += 1,
            BatchOperation::CreateClass(_)
            | BatchOperation::UpdateClass(_)
            | BatchOperation::DeleteClass(_) => counts.classes += 1,
        }
    }
    counts
}
