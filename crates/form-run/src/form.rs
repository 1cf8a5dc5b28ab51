//! Beam search over a form's steps.

use form_core::errors::FormError;
use form_core::{DataType, Exemplar, ExemplarsPool, Form, FormId, Signal};
use form_eval::{Evaluator, ReferenceTable};
use form_puzzle::StrategyRegistry;
use form_schema::Schema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::step::{ExemplarIds, StepReport, StepRunner};

/// What a run did, step by step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Form that was run.
    pub form_id: FormId,
    /// Schema fingerprint of the form.
    pub schema_fingerprint: String,
    /// Seminal time in seconds.
    pub seminal_t: f64,
    /// One report per step, in order.
    pub steps: Vec<StepReport>,
    /// Exemplars in the final pool.
    pub final_pool: usize,
    /// Best score in the final pool.
    pub best_evaluation: Option<f64>,
}

/// Final pool and its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRun {
    /// Surviving exemplars, best first.
    pub pool: ExemplarsPool,
    /// Per-step counters.
    pub summary: RunSummary,
}

/// Compiled, bound and configured form ready to run on signals.
pub struct FormRunner {
    form: Form,
    schema: Schema,
    config: EngineConfig,
    steps: Vec<StepRunner>,
    evaluator: Option<Box<dyn Evaluator>>,
}

impl std::fmt::Debug for FormRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormRunner")
            .field("form", &self.form.name)
            .field("config", &self.config)
            .field("steps", &self.steps.len())
            .field("evaluator", &self.evaluator.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl FormRunner {
    /// Validates the config, compiles the schema and binds every puzzle.
    pub fn new(
        form: Form,
        registry: &StrategyRegistry,
        config: EngineConfig,
        evaluator: Option<Box<dyn Evaluator>>,
    ) -> Result<Self, FormError> {
        config.validate()?;
        let schema = Schema::compile(&form)?;
        let steps = form
            .steps
            .iter()
            .enumerate()
            .map(|(position, step)| {
                StepRunner::new(position, step, &form, registry, &schema, config.epsilon_for_dubles)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(form = %form.name, steps = steps.len(), "form runner ready");
        Ok(Self {
            form,
            schema,
            config,
            steps,
            evaluator,
        })
    }

    /// Fits the configured evaluator on the form's numeric parameters.
    pub fn with_reference(
        form: Form,
        registry: &StrategyRegistry,
        config: EngineConfig,
        positive: &ReferenceTable,
        contrast: Option<&ReferenceTable>,
    ) -> Result<Self, FormError> {
        let parameters = numeric_parameters(&form);
        let evaluator = config
            .evaluator_or_default()
            .fit(&parameters, positive, contrast, config.seed)?;
        Self::new(form, registry, config, Some(evaluator))
    }

    /// The form being run.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Compiled schedule.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every step from an empty exemplar anchored at `seminal_t`.
    pub fn run(&self, signal: Signal, seminal_t: f64) -> Result<FormRun, FormError> {
        if !signal.is_moment_in_signal(seminal_t) {
            return Err(FormError::invalid_interval(
                self.form.id,
                None,
                "seminal point lies outside the signal",
            )
            .with_context("seminal_t", seminal_t.to_string()));
        }
        let capacity = self.config.max_pool_size;
        let mut ids = ExemplarIds::default();
        let mut pool = ExemplarsPool::new(capacity)?;
        pool.insert(Exemplar::new(ids.next_id(), signal));

        let evaluator = self.evaluator.as_deref();
        let mut reports = Vec::with_capacity(self.steps.len());
        let mut previous_target: Option<&str> = None;
        for step in &self.steps {
            let parents = pool.drain();
            let mut next = ExemplarsPool::new(capacity)?;
            let mut report = step.report();
            for parent in &parents {
                let centre = match previous_target {
                    None => Some(seminal_t),
                    Some(name) => parent.point(name),
                };
                for child in step.run(parent, centre, &mut ids, evaluator, &mut report)? {
                    if next.insert(child).is_some() {
                        report.evicted += 1;
                    }
                }
            }
            info!(
                step = step.num(),
                parents = report.parents,
                children = report.children,
                killed = report.total_killed(),
                pool = next.len(),
                "step finished"
            );
            reports.push(report);
            pool = next;
            previous_target = Some(step.target());
        }

        let summary = RunSummary {
            form_id: self.form.id,
            schema_fingerprint: self.schema.fingerprint()?,
            seminal_t,
            steps: reports,
            final_pool: pool.len(),
            best_evaluation: pool.best().and_then(Exemplar::evaluation),
        };
        Ok(FormRun { pool, summary })
    }

    /// Runs and keeps only the final pool.
    pub fn run_pool(&self, signal: Signal, seminal_t: f64) -> Result<ExemplarsPool, FormError> {
        self.run(signal, seminal_t).map(|run| run.pool)
    }
}

/// Names of the form's int and float parameters, in declaration order.
pub fn numeric_parameters(form: &Form) -> Vec<String> {
    form.parameters
        .iter()
        .filter(|param| matches!(param.data_type, DataType::Int | DataType::Float))
        .map(|param| param.name.clone())
        .collect()
}
