use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use erpgen_codegen::{
    collect_referrers, CodegenOptions, Family, GeneratedFile, GenerationContext, Generator,
    GeneratorRegistry, IndexEntry, IndexGenerator, JobTarget,
};
use erpgen_core::{now_rfc3339, short_id, ListResult, ServiceConfig, ServiceError};
use erpgen_fixture::{FixturePlan, ReferenceSnapshot, Synthesizer};
use erpgen_ir::{IrError, MetadataDocument, ModelSpec};

use crate::archive::ArchiveBuilder;
use crate::error::JobError;
use crate::model::{BatchReport, JobRecord, JobState, JobStatus, ModelFailure, SubmitJobRequest};
use crate::reference::{ReferenceSource, StaticReferences};
use crate::registry::JobRegistry;
use crate::store::SchemaStore;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Deadlines and generation settings of the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// One generator strategy for one model.
    pub generation_step: Duration,
    /// Fixture synthesis for one model.
    pub fixture_step: Duration,
    /// One schema document write.
    pub persist_step: Duration,
    /// Capturing the reference snapshot.
    pub snapshot: Duration,
    pub codegen: CodegenOptions,
    pub plan: FixturePlan,
    /// Fixture RNG seed; `None` draws a fresh one per model.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn from_service(config: &ServiceConfig) -> Self {
        Self {
            generation_step: config.timeouts.generation_step(),
            fixture_step: config.timeouts.fixture_step(),
            persist_step: config.timeouts.persist_step(),
            snapshot: config.timeouts.snapshot(),
            codegen: CodegenOptions {
                menu_module: config.codegen.menu_module.clone(),
                inactive_models: config.codegen.inactive_models.clone(),
                table_prefixes: config.codegen.table_prefixes.clone(),
            },
            plan: FixturePlan {
                valid_cases: config.fixtures.valid_cases,
                invalid_cases: config.fixtures.invalid_cases,
                invalid_id_cases: config.fixtures.invalid_id_cases,
            },
            seed: config.fixtures.seed,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_service(&ServiceConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Batch output
// ---------------------------------------------------------------------------

/// Result of one batch.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Zip bytes.
    pub archive: Vec<u8>,
    /// Archive entries, in archive order.
    pub paths: Vec<String>,
    pub report: BatchReport,
}

enum ModelOutcome {
    Generated(Vec<GeneratedFile>),
    Rejected(ModelFailure),
}

struct StoredArchive {
    bytes: Arc<Vec<u8>>,
    stored_at: DateTime<Utc>,
}

fn step_label(step: &str, model: &str) -> String {
    format!("{step} step for `{model}`")
}

fn panic_detail(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run `work` on the blocking pool under `limit`.
async fn run_step<T, F>(step: &str, limit: Duration, work: F) -> Result<T, JobError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(JobError::Panicked {
            step: step.to_string(),
            detail: panic_detail(e),
        }),
        Err(_) => Err(JobError::Timeout {
            step: step.to_string(),
            after: limit,
        }),
    }
}

// ---------------------------------------------------------------------------
// JobEngine
// ---------------------------------------------------------------------------

/// Runs generation batches and keeps their archives.
///
/// Models of a batch run one after another; every generator call, fixture
/// synthesis and persistence write is its own timed unit on the blocking
/// pool. A step that times out or panics fails the whole batch. A model whose
/// metadata is defective is left out and reported, and the batch carries on.
pub struct JobEngine {
    registry: Arc<JobRegistry>,
    archives: RwLock<HashMap<String, StoredArchive>>,
    generators: GeneratorRegistry,
    references: Arc<dyn ReferenceSource>,
    schema_store: Option<Arc<dyn SchemaStore>>,
    config: EngineConfig,
}

impl JobEngine {
    /// Engine with the standard generators, an empty snapshot and no
    /// persistence.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            archives: RwLock::new(HashMap::new()),
            generators: GeneratorRegistry::standard(),
            references: Arc::new(StaticReferences::default()),
            schema_store: None,
            config,
        }
    }

    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceSource>) -> Self {
        self.references = references;
        self
    }

    pub fn with_schema_store(mut self, store: Arc<dyn SchemaStore>) -> Self {
        self.schema_store = Some(store);
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =======================================================================
    // Job lifecycle
    // =======================================================================

    /// Register a job and start it in the background.
    pub fn submit(self: &Arc<Self>, req: SubmitJobRequest) -> Result<JobRecord, ServiceError> {
        if req.documents.is_empty() {
            return Err(ServiceError::Validation(
                "at least one metadata document is required".into(),
            ));
        }

        let record = JobRecord {
            id: format!("{}-{}", req.target.code(), short_id()),
            target: req.target,
            state: JobState::Pending,
            documents: req.documents.len(),
            error: None,
            report: None,
            created_at: now_rfc3339(),
            started_at: None,
            ended_at: None,
        };
        self.registry.insert(record.clone());
        info!(
            job_id = %record.id,
            target = %record.target,
            documents = record.documents,
            "job submitted"
        );

        let engine = Arc::clone(self);
        let job_id = record.id.clone();
        tokio::spawn(async move {
            engine.run(&job_id, req.target, &req.documents).await;
        });

        Ok(record)
    }

    async fn run(&self, job_id: &str, target: JobTarget, documents: &[String]) {
        self.registry.set(job_id, JobState::Running);

        match self.generate(target, documents).await {
            Ok(output) => {
                info!(
                    job_id,
                    generated = output.report.generated.len(),
                    failed = output.report.failed.len(),
                    artifacts = output.report.artifacts,
                    "job completed"
                );
                self.store_archive(job_id, output.archive);
                self.registry.update(job_id, |record| {
                    record.state = JobState::Completed;
                    record.report = Some(output.report);
                });
            }
            Err(e) => {
                error!(job_id, "job failed: {e}");
                self.registry.update(job_id, |record| {
                    record.state = JobState::Failed;
                    record.error = Some(e.to_string());
                });
            }
        }
    }

    // =======================================================================
    // Batch
    // =======================================================================

    /// Run one batch to completion without registering a job.
    pub async fn generate(
        &self,
        target: JobTarget,
        documents: &[String],
    ) -> Result<BatchOutput, JobError> {
        let mut parsed = Vec::with_capacity(documents.len());
        for (i, text) in documents.iter().enumerate() {
            let doc = MetadataDocument::parse(text).map_err(|source| JobError::Parse {
                index: i + 1,
                source,
            })?;
            parsed.push(doc);
        }

        let specs: Vec<Result<ModelSpec, IrError>> =
            parsed.iter().map(ModelSpec::from_document).collect();
        let models: Vec<ModelSpec> = specs.iter().filter_map(|s| s.as_ref().ok().cloned()).collect();

        let snapshot = if target.includes(Family::Fixtures) {
            Some(Arc::new(self.capture_snapshot(&models).await?))
        } else {
            None
        };

        let options = Arc::new(self.config.codegen.clone());
        let generators = self.generators.for_target(target);
        let mut archive = ArchiveBuilder::new();
        let mut entries = Vec::with_capacity(specs.len());
        let mut report = BatchReport::default();

        for (i, spec) in specs.into_iter().enumerate() {
            let model = match spec {
                Ok(model) => model,
                Err(e) => {
                    let name = match parsed[i].model.trim() {
                        "" => format!("#{}", i + 1),
                        name => name.to_string(),
                    };
                    warn!(model = %name, "model rejected: {e}");
                    entries.push(IndexEntry::failed(&name, e.to_string()));
                    report.failed.push(ModelFailure {
                        model: name,
                        family: None,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let name = model.model_name.clone();
            self.persist(&name, &documents[i]).await?;

            let referrers = collect_referrers(&models, &name, &options.table_prefixes);
            let ctx = Arc::new(GenerationContext::new(model, Arc::clone(&options)).with_referrers(referrers));

            match self.model_artifacts(&ctx, &generators, snapshot.as_ref()).await? {
                ModelOutcome::Generated(files) => {
                    debug!(model = %name, files = files.len(), "model generated");
                    archive.extend(files)?;
                    entries.push(IndexEntry::generated(&name, &ctx.model.class_name));
                    report.generated.push(name);
                }
                ModelOutcome::Rejected(failure) => {
                    warn!(model = %name, "model rejected: {}", failure.reason);
                    entries.push(IndexEntry::failed(&name, &failure.reason));
                    report.failed.push(failure);
                }
            }
        }

        for family in target.families() {
            archive.add(IndexGenerator::new(*family).generate(&entries))?;
        }

        report.artifacts = archive.len();
        let paths = archive.paths().map(str::to_string).collect();
        Ok(BatchOutput {
            archive: archive.finish()?,
            paths,
            report,
        })
    }

    /// Batch models plus every model they reference.
    async fn capture_snapshot(&self, models: &[ModelSpec]) -> Result<ReferenceSnapshot, JobError> {
        let mut names: Vec<String> = models.iter().map(|m| m.model_name.clone()).collect();
        for target in models
            .iter()
            .flat_map(|m| m.reference_fields().filter_map(|f| f.reference()))
        {
            if !names.contains(&target.model) {
                names.push(target.model.clone());
            }
        }

        let limit = self.config.snapshot;
        match tokio::time::timeout(limit, self.references.snapshot(&names)).await {
            Ok(snapshot) => snapshot,
            Err(_) => Err(JobError::Timeout {
                step: "reference snapshot".to_string(),
                after: limit,
            }),
        }
    }

    async fn persist(&self, model: &str, document: &str) -> Result<(), JobError> {
        let Some(store) = &self.schema_store else {
            return Ok(());
        };
        let store = Arc::clone(store);
        let (name, document) = (model.to_string(), document.to_string());
        run_step(
            &step_label("persist", model),
            self.config.persist_step,
            move || store.persist(&name, &document),
        )
        .await?
    }

    async fn model_artifacts(
        &self,
        ctx: &Arc<GenerationContext>,
        generators: &[Arc<dyn Generator>],
        snapshot: Option<&Arc<ReferenceSnapshot>>,
    ) -> Result<ModelOutcome, JobError> {
        let model = ctx.model.model_name.clone();
        let mut files = Vec::new();

        for generator in generators {
            let family = generator.family();
            let step = step_label(family.as_str(), &model);
            let work = {
                let generator = Arc::clone(generator);
                let ctx = Arc::clone(ctx);
                move || generator.generate(&ctx)
            };
            match run_step(&step, self.config.generation_step, work).await? {
                Ok(generated) => files.extend(generated),
                Err(e) if e.is_schema_defect() => {
                    return Ok(ModelOutcome::Rejected(ModelFailure {
                        model,
                        family: Some(family),
                        reason: e.to_string(),
                    }));
                }
                Err(source) => return Err(JobError::Codegen { step, source }),
            }
        }

        if let Some(snapshot) = snapshot {
            let step = step_label(Family::Fixtures.as_str(), &model);
            let work = {
                let ctx = Arc::clone(ctx);
                let snapshot = Arc::clone(snapshot);
                let (plan, seed) = (self.config.plan, self.config.seed);
                move || {
                    let focused = snapshot.focus(&ctx.model.model_name);
                    Synthesizer::new(plan, seed)
                        .synthesize(&ctx.model, &ctx.constraints, &focused)
                        .and_then(|suite| suite.to_file())
                }
            };
            match run_step(&step, self.config.fixture_step, work).await? {
                Ok(file) => files.push(file),
                Err(e) if e.is_schema_defect() => {
                    return Ok(ModelOutcome::Rejected(ModelFailure {
                        model,
                        family: Some(Family::Fixtures),
                        reason: e.to_string(),
                    }));
                }
                Err(source) => return Err(JobError::Fixture { step, source }),
            }
        }

        Ok(ModelOutcome::Generated(files))
    }

    // =======================================================================
    // Archives
    // =======================================================================

    fn store_archive(&self, job_id: &str, bytes: Vec<u8>) {
        self.archives
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                job_id.to_string(),
                StoredArchive {
                    bytes: Arc::new(bytes),
                    stored_at: Utc::now(),
                },
            );
    }

    /// Archive of a completed job.
    pub fn archive(&self, job_id: &str) -> Result<Arc<Vec<u8>>, ServiceError> {
        let record = self.record(job_id)?;
        match record.state {
            JobState::Pending | JobState::Running => Err(ServiceError::NotReady(format!(
                "job '{job_id}' is still processing"
            ))),
            JobState::Failed => Err(ServiceError::NotFound(format!(
                "job '{job_id}' failed: {}",
                record.error.unwrap_or_default()
            ))),
            JobState::Completed => self
                .archives
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .get(job_id)
                .map(|a| Arc::clone(&a.bytes))
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("archive of job '{job_id}' has expired"))
                }),
        }
    }

    /// Drop archives stored longer than `ttl` ago. Returns how many went.
    pub fn evict_expired(&self, ttl: chrono::Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let mut archives = self
            .archives
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = archives.len();
        archives.retain(|_, a| a.stored_at > cutoff);
        before - archives.len()
    }

    // =======================================================================
    // Query
    // =======================================================================

    pub fn status(&self, job_id: &str) -> JobStatus {
        self.registry.get(job_id)
    }

    pub fn record(&self, job_id: &str) -> Result<JobRecord, ServiceError> {
        self.registry
            .record(job_id)
            .ok_or_else(|| ServiceError::NotFound(format!("job '{job_id}' not found")))
    }

    pub fn list(&self) -> ListResult<JobRecord> {
        ListResult::new(self.registry.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySchemaStore;
    use erpgen_codegen::CodegenError;
    use std::io::{Cursor, Read};

    pub(crate) const PERSON: &str = r#"
<root>
  <system_code>ERP</system_code>
  <sub_system_code>HRM</sub_system_code>
  <module_code>EMP</module_code>
  <model>person</model>
  <default_order>code asc</default_order>
  <fields>
    <field name="id" type="integer"/>
    <field name="code" type="varchar" label="Mã nhân viên" not_null="1" max_length="10" unique="1"/>
    <field name="name" type="varchar" label="Tên nhân viên" not_null="1" max_length="50"/>
    <field name="email" type="varchar" email="1"/>
  </fields>
</root>
"#;

    pub(crate) const PROJECT: &str = r#"
<root>
  <system_code>ERP</system_code>
  <sub_system_code>PMS</sub_system_code>
  <module_code>PRJ</module_code>
  <model>project</model>
  <fields>
    <field name="id" type="integer"/>
    <field name="code" type="varchar" not_null="1" max_length="20"/>
    <field name="owner_id" type="integer" foreign_key="person,code,name"/>
    <field name="budget" type="float" min="0"/>
  </fields>
</root>
"#;

    const BROKEN_TYPE: &str = r#"<root><model>ghost</model><fields>
        <field name="id" type="integer"/>
        <field name="shape" type="hologram"/>
    </fields></root>"#;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            seed: Some(7),
            ..EngineConfig::default()
        }
    }

    fn snapshot() -> Arc<dyn ReferenceSource> {
        Arc::new(StaticReferences::new(
            ReferenceSnapshot::new()
                .with_table("person", vec![1, 2, 3], 4)
                .with_table("project", vec![10], 11),
        ))
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        zip.file_names().map(str::to_string).collect()
    }

    fn entry(bytes: &[u8], name: &str) -> String {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut content = String::new();
        zip.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    async fn wait(engine: &JobEngine, job_id: &str) -> JobRecord {
        for _ in 0..500 {
            let record = engine.record(job_id).unwrap();
            if record.state.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} never finished");
    }

    struct Sleepy(Duration);

    impl Generator for Sleepy {
        fn family(&self) -> Family {
            Family::Model
        }

        fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
            std::thread::sleep(self.0);
            Ok(vec![GeneratedFile::new(
                ctx.path(Family::Model, &format!("{}.py", ctx.model.model_name)),
                "",
            )])
        }
    }

    struct Exploding;

    impl Generator for Exploding {
        fn family(&self) -> Family {
            Family::Route
        }

        fn generate(&self, _ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
            panic!("route table corrupted");
        }
    }

    struct Colliding;

    impl Generator for Colliding {
        fn family(&self) -> Family {
            Family::View
        }

        fn generate(&self, _ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
            Ok(vec![GeneratedFile::new("backend/views/shared.sql", "")])
        }
    }

    fn registry_of(generator: Arc<dyn Generator>) -> GeneratorRegistry {
        let mut registry = GeneratorRegistry::new();
        registry.register(generator);
        registry
    }

    #[tokio::test]
    async fn full_batch_archive() {
        let engine = JobEngine::new(config()).with_references(snapshot());
        let output = engine
            .generate(JobTarget::Full, &docs(&[PERSON, PROJECT]))
            .await
            .unwrap();

        assert_eq!(output.report.generated, vec!["person", "project"]);
        assert!(output.report.failed.is_empty());

        let names = entry_names(&output.archive);
        for expected in [
            "backend/models/person.py",
            "backend/controllers/project.py",
            "backend/routes/__init__.py",
            "backend/views/index.sql",
            "frontend/columnsettings/PersonFields.js",
            "frontend/translations/project/vi.json",
            "frontend/navigation/navigation.js",
            "unittest/person.json",
            "unittest/index.json",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(output.paths, names);
        assert_eq!(output.report.artifacts, names.len());

        // Placeholders are bound against the snapshot.
        let fixtures = entry(&output.archive, "unittest/project.json");
        assert!(fixtures.contains("/api/project/10"));
        assert!(!fixtures.contains("{valid_id}"));
    }

    #[tokio::test]
    async fn same_batch_same_bytes() {
        let engine = JobEngine::new(config()).with_references(snapshot());
        let batch = docs(&[PERSON, PROJECT]);
        let first = engine.generate(JobTarget::Full, &batch).await.unwrap();
        let second = engine.generate(JobTarget::Full, &batch).await.unwrap();
        assert_eq!(first.archive, second.archive);
    }

    #[tokio::test]
    async fn backend_target_only_writes_backend() {
        let engine = JobEngine::new(config());
        let output = engine
            .generate(JobTarget::Backend, &docs(&[PERSON]))
            .await
            .unwrap();
        assert!(output.paths.iter().all(|p| p.starts_with("backend/")));
        assert_eq!(output.paths.len(), 8);
    }

    #[tokio::test]
    async fn schema_defect_fails_only_that_model() {
        let engine = JobEngine::new(config());
        let output = engine
            .generate(JobTarget::Backend, &docs(&[PERSON, BROKEN_TYPE]))
            .await
            .unwrap();
        assert_eq!(output.report.generated, vec!["person"]);
        assert_eq!(output.report.failed.len(), 1);
        assert_eq!(output.report.failed[0].model, "ghost");
        assert_eq!(output.report.failed[0].family, None);

        let index = entry(&output.archive, "backend/models/__init__.py");
        assert!(index.contains("FAILED ghost"));
        assert!(!output.paths.iter().any(|p| p.contains("ghost")));
    }

    #[tokio::test]
    async fn alias_exhaustion_names_the_family() {
        let mut fields = String::new();
        for i in 0..101 {
            fields.push_str(&format!("<field name=\"abc_{i}\" type=\"varchar\"/>"));
        }
        let crowded = format!("<root><model>crowded</model><fields>{fields}</fields></root>");
        let engine = JobEngine::new(config());
        let output = engine
            .generate(JobTarget::Backend, &[crowded, PERSON.to_string()])
            .await
            .unwrap();
        assert_eq!(output.report.failed[0].family, Some(Family::Model));
        assert_eq!(output.report.generated, vec!["person"]);
    }

    #[tokio::test]
    async fn unreadable_document_fails_the_batch() {
        let engine = JobEngine::new(config());
        let err = engine
            .generate(JobTarget::Backend, &docs(&[PERSON, "{\"model\": "]))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Parse { index: 2, .. }), "{err}");
    }

    #[tokio::test]
    async fn step_timeout_fails_the_job() {
        let engine = Arc::new(
            JobEngine::new(EngineConfig {
                generation_step: Duration::from_millis(20),
                ..config()
            })
            .with_generators(registry_of(Arc::new(Sleepy(Duration::from_millis(300))))),
        );
        let record = engine
            .submit(SubmitJobRequest {
                target: JobTarget::Backend,
                documents: docs(&[PERSON]),
            })
            .unwrap();
        assert!(record.id.starts_with("BE-"));
        assert_eq!(record.id.len(), "BE-".len() + 8);

        let done = wait(&engine, &record.id).await;
        assert_eq!(done.state, JobState::Failed);
        let error = done.error.unwrap();
        assert!(error.contains("model step for `person`"), "{error}");
        assert!(error.contains("timed out"), "{error}");
        assert_eq!(engine.status(&record.id), JobStatus::Failed);
    }

    #[tokio::test]
    async fn panicking_generator_fails_the_job() {
        let engine = JobEngine::new(config()).with_generators(registry_of(Arc::new(Exploding)));
        let err = engine
            .generate(JobTarget::Backend, &docs(&[PERSON]))
            .await
            .unwrap_err();
        assert!(matches!(&err, JobError::Panicked { detail, .. } if detail == "route table corrupted"));
        assert!(err.to_string().contains("route step for `person`"));
    }

    #[tokio::test]
    async fn colliding_paths_fail_the_batch() {
        let engine = JobEngine::new(config()).with_generators(registry_of(Arc::new(Colliding)));
        let err = engine
            .generate(JobTarget::Backend, &docs(&[PERSON, PROJECT]))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::DuplicatePath(p) if p == "backend/views/shared.sql"));
    }

    #[tokio::test]
    async fn documents_are_persisted() {
        let store = Arc::new(MemorySchemaStore::new());
        let engine = JobEngine::new(config()).with_schema_store(store.clone());
        engine
            .generate(JobTarget::Frontend, &docs(&[PERSON, PROJECT]))
            .await
            .unwrap();
        assert_eq!(store.models(), vec!["person", "project"]);
        assert_eq!(store.get("person").as_deref(), Some(PERSON));
    }

    #[tokio::test]
    async fn archive_lifecycle() {
        let engine = Arc::new(
            JobEngine::new(config())
                .with_generators(registry_of(Arc::new(Sleepy(Duration::from_millis(200))))),
        );
        assert!(matches!(engine.archive("BE-00000000"), Err(ServiceError::NotFound(_))));
        assert_eq!(engine.status("BE-00000000"), JobStatus::Unknown);

        let record = engine
            .submit(SubmitJobRequest {
                target: JobTarget::Backend,
                documents: docs(&[PERSON]),
            })
            .unwrap();
        assert!(matches!(engine.archive(&record.id), Err(ServiceError::NotReady(_))));

        let done = wait(&engine, &record.id).await;
        assert_eq!(done.state, JobState::Completed);
        assert!(done.started_at.is_some() && done.ended_at.is_some());
        let bytes = engine.archive(&record.id).unwrap();
        assert!(entry_names(&bytes).contains(&"backend/models/person.py".to_string()));

        assert_eq!(engine.evict_expired(chrono::Duration::hours(1)), 0);
        assert_eq!(engine.evict_expired(chrono::Duration::zero()), 1);
        assert!(matches!(engine.archive(&record.id), Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_submission_is_rejected() {
        let engine = Arc::new(JobEngine::new(config()));
        let err = engine
            .submit(SubmitJobRequest {
                target: JobTarget::Full,
                documents: Vec::new(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(engine.registry().is_empty());
    }
}
