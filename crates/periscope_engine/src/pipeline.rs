//! Query pipeline orchestration.
//!
//! ```text
//! Idle -> Initializing -> Parsing -> Validating -> Executing -> Finalizing -> Done
//!              |             |           |             |
//!              +-------------+-----------+-------------+--> Done (aborted, no data)
//! ```
//!
//! A fault in `Init` or in any parse, validation or execution-start hook
//! ends the query with no data and only the recovered faults as errors.
//! Once execution has started, faults are appended to a response that keeps
//! its data.
//!
//! Finish functions of a stage that aborts are not run for the stages that
//! follow it: a query that stops during parsing never reaches validation
//! hooks, and extension results are only collected after execution.

use core::fmt;

use periscope_context::Context;
use periscope_query::ast::Document;
use periscope_query::parser::parse;
use periscope_query::validation::validate;
use periscope_query::{QueryError, Value};

use crate::error::PhaseError;
use crate::executor::{Executor, coerce_variables};
use crate::extension::{ExecutionFinishFn, ParseFinishFn, ValidationFinishFn};
use crate::hooks::Stage;
use crate::request::Request;
use crate::response::{Response, ResultAggregator};
use crate::schema::Schema;

/// Position of a query in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Running `init` hooks.
    Initializing,
    /// Parsing the document.
    Parsing,
    /// Validating the document.
    Validating,
    /// Resolving fields.
    Executing,
    /// Running execution finish functions and collecting results.
    Finalizing,
    /// Finished, with or without data.
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Initializing => "initializing",
            PipelineState::Parsing => "parsing",
            PipelineState::Validating => "validating",
            PipelineState::Executing => "executing",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Drives one request through the pipeline.
pub(crate) struct Pipeline<'s> {
    schema: &'s Schema,
    state: PipelineState,
}

impl<'s> Pipeline<'s> {
    pub(crate) fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            state: PipelineState::Idle,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
    }

    fn abort<E: Into<QueryError>>(&mut self, errors: impl IntoIterator<Item = E>) -> Response {
        let response = ResultAggregator::aborted(errors);
        tracing::debug!(
            state = %self.state,
            errors = response.errors.len(),
            "query aborted"
        );
        self.transition(PipelineState::Done);
        response
    }

    pub(crate) async fn run(mut self, request: Request) -> Response {
        let extensions = self.schema.extensions();

        self.transition(PipelineState::Initializing);
        let (ctx, errors) = extensions.init(&request.context, &request);
        if aborts(&errors) {
            return self.abort(errors);
        }

        self.transition(PipelineState::Parsing);
        let (ctx, document) = match self.parse(&ctx, &request.query) {
            Ok(parsed) => parsed,
            Err(errors) => return self.abort(errors),
        };

        self.transition(PipelineState::Validating);
        let ctx = match self.validate(&ctx, &document) {
            Ok(ctx) => ctx,
            Err(errors) => return self.abort(errors),
        };

        self.transition(PipelineState::Executing);
        let start = extensions.did_start(Stage::Execution, &ctx, |ext, ctx| {
            ext.execution_did_start(ctx)
        });
        if aborts(&start.errors) {
            return self.abort(start.errors);
        }
        let ctx = start.context;

        let mut result = ResultAggregator::new();
        self.execute(&ctx, &document, &request, &mut result).await;

        self.transition(PipelineState::Finalizing);
        let finish_errors = start
            .pending
            .finish_all(|finish: ExecutionFinishFn| finish(result.view()));
        result.append_phase_errors(finish_errors);

        let (payloads, errors) = extensions.results(&ctx);
        result.append_phase_errors(errors);
        result.attach_extensions(payloads);

        self.transition(PipelineState::Done);
        result.finish()
    }

    fn parse(&self, ctx: &Context, query: &str) -> Result<(Context, Document), Vec<QueryError>> {
        let start = self
            .schema
            .extensions()
            .did_start(Stage::Parse, ctx, |ext, ctx| ext.parse_did_start(ctx));
        if aborts(&start.errors) {
            return Err(into_query_errors(start.errors));
        }

        let parsed = parse(query).map_err(QueryError::from);
        let finish_errors = start
            .pending
            .finish_all(|finish: ParseFinishFn| finish(parsed.as_ref().err()));
        let aborted = aborts(&finish_errors);
        let mut errors = into_query_errors(finish_errors);

        match parsed {
            Err(err) => {
                errors.push(err);
                Err(errors)
            }
            Ok(_) if aborted => Err(errors),
            Ok(document) => Ok((start.context, document)),
        }
    }

    fn validate(&self, ctx: &Context, document: &Document) -> Result<Context, Vec<QueryError>> {
        let start = self
            .schema
            .extensions()
            .did_start(Stage::Validation, ctx, |ext, ctx| ext.validation_did_start(ctx));
        if aborts(&start.errors) {
            return Err(into_query_errors(start.errors));
        }

        let validation_errors = validate(self.schema.types(), document);
        let finish_errors = start
            .pending
            .finish_all(|finish: ValidationFinishFn| finish(&validation_errors));
        let aborted = aborts(&finish_errors);
        let mut errors = into_query_errors(finish_errors);

        if !validation_errors.is_empty() {
            errors.extend(validation_errors);
            return Err(errors);
        }
        if aborted {
            return Err(errors);
        }
        Ok(start.context)
    }

    async fn execute(
        &self,
        ctx: &Context,
        document: &Document,
        request: &Request,
        result: &mut ResultAggregator,
    ) {
        let operation = match document.operation(request.operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(message) => {
                result.append([QueryError::new(message)]);
                return;
            }
        };
        let variables = match coerce_variables(self.schema.types(), operation, &request.variables)
        {
            Ok(variables) => variables,
            Err(errors) => {
                result.append(errors);
                return;
            }
        };

        let executor = Executor::new(
            self.schema.types(),
            self.schema.extensions(),
            *self.schema.config(),
            variables,
        );
        let data: Option<Value> = executor.execute(operation, &request.root_value, ctx).await;
        result.set_data(data);
        result.append(executor.into_errors());
    }
}

/// Returns `true` if any recovered fault ends the query.
fn aborts(errors: &[PhaseError]) -> bool {
    errors.iter().any(|error| error.phase.aborts_query())
}

fn into_query_errors<E: Into<QueryError>>(errors: Vec<E>) -> Vec<QueryError> {
    errors.into_iter().map(Into::into).collect()
}
