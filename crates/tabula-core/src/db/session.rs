use crate::{
    config::{ConfigError, ExecutorConfig},
    db::{
        executor::{LoadExecutor, MutationExecutor},
        query::{DeleteSpec, Projector, QueryError, QuerySpec, TypedQuery, UpdateSpec},
        response::{Page, PageRequest, QueryResults, Response},
        source::{BulkMutation, RowSource},
    },
    error::InternalError,
    obs::{MetricsSink, sink::GLOBAL_METRICS_SINK},
};

///
/// Session
///
/// Session-scoped handle over one row source with policy (debug narration,
/// metrics sink, executor config) and execution routing.
///
/// Sessions never cache results; executing the same `TypedQuery` twice
/// scans the source twice.
///

pub struct Session<'a> {
    source: &'a dyn RowSource,
    mutations: Option<&'a dyn BulkMutation>,
    config: ExecutorConfig,
    debug: bool,
    metrics: &'a dyn MetricsSink,
}

impl<'a> Session<'a> {
    /// Session over a store that serves both reads and bulk mutations.
    #[must_use]
    pub fn new<S>(store: &'a S) -> Self
    where
        S: RowSource + BulkMutation,
    {
        Self {
            source: store,
            mutations: Some(store),
            config: ExecutorConfig::default(),
            debug: false,
            metrics: &GLOBAL_METRICS_SINK,
        }
    }

    /// Session that rejects `update` and `delete`.
    #[must_use]
    pub fn read_only(source: &'a dyn RowSource) -> Self {
        Self {
            source,
            mutations: None,
            config: ExecutorConfig::default(),
            debug: false,
            metrics: &GLOBAL_METRICS_SINK,
        }
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'a dyn MetricsSink) -> Self {
        self.metrics = sink;
        self
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;

        Ok(self)
    }

    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    const fn load_executor(&self) -> LoadExecutor<'a> {
        LoadExecutor::new(self.source, self.config, self.debug, self.metrics)
    }

    // ---------------------------------------------------------------------
    // Fetch terminals
    // ---------------------------------------------------------------------

    /// Execute and materialize every row inside the query window.
    pub fn execute<P: Projector>(
        &self,
        query: &TypedQuery<P>,
    ) -> Result<Response<P::Output>, QueryError> {
        let spec = query.spec();
        let rows = self
            .load_executor()
            .execute(spec)?
            .into_iter()
            .map(P::project)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Response::new(root_name(spec), rows))
    }

    pub fn fetch<P: Projector>(&self, query: &TypedQuery<P>) -> Result<Vec<P::Output>, QueryError> {
        Ok(self.execute(query)?.into_vec())
    }

    /// At most one row; more than one is a `NotUnique` response error.
    pub fn fetch_one<P: Projector>(
        &self,
        query: &TypedQuery<P>,
    ) -> Result<Option<P::Output>, QueryError> {
        Ok(self.execute(query)?.one_opt()?)
    }

    /// First row of the ordered result, fetched through a one-row window.
    pub fn fetch_first<P: Projector>(
        &self,
        query: &TypedQuery<P>,
    ) -> Result<Option<P::Output>, QueryError> {
        let page = query.spec().page();
        let limited = query.with_window(page.offset, Some(page.limit.map_or(1, |l| l.min(1))));

        Ok(self.execute(&limited)?.first())
    }

    /// Row count of the query ignoring its window.
    pub fn fetch_count<P: Projector>(&self, query: &TypedQuery<P>) -> Result<u64, QueryError> {
        self.load_executor().count(query.spec())
    }

    /// Windowed rows plus the total count; runs the query twice.
    pub fn fetch_results<P: Projector>(
        &self,
        query: &TypedQuery<P>,
    ) -> Result<QueryResults<P::Output>, QueryError> {
        let total = self.fetch_count(query)?;
        let results = self.fetch(query)?;
        let page = query.spec().page();

        Ok(QueryResults {
            total,
            limit: page.limit,
            offset: page.offset,
            results,
        })
    }

    /// One page with an always-executed count query.
    pub fn fetch_page<P: Projector>(
        &self,
        query: &TypedQuery<P>,
        request: PageRequest,
    ) -> Result<Page<P::Output>, QueryError> {
        let windowed = query.with_window(request.offset(), Some(request.size));

        Ok(Page::from_results(self.fetch_results(&windowed)?, request))
    }

    /// One page whose count query runs only when the content cannot
    /// determine the total.
    pub fn fetch_page_lazy<P: Projector>(
        &self,
        query: &TypedQuery<P>,
        request: PageRequest,
    ) -> Result<Page<P::Output>, QueryError> {
        let windowed = query.with_window(request.offset(), Some(request.size));
        let content = self.fetch(&windowed)?;

        Page::with_lazy_count(content, request, || self.fetch_count(query))
    }

    // ---------------------------------------------------------------------
    // Bulk mutation
    // ---------------------------------------------------------------------

    /// Returns the number of rows changed. Cached views of those rows are
    /// stale afterwards.
    pub fn update(&self, spec: &UpdateSpec) -> Result<u64, QueryError> {
        self.mutation_executor()?.update(spec)
    }

    /// Returns the number of rows removed.
    pub fn delete(&self, spec: &DeleteSpec) -> Result<u64, QueryError> {
        self.mutation_executor()?.delete(spec)
    }

    fn mutation_executor(&self) -> Result<MutationExecutor<'a>, QueryError> {
        let backend = self.mutations.ok_or_else(|| {
            InternalError::store_unsupported("session is read-only; bulk mutation rejected")
        })?;

        Ok(MutationExecutor::new(
            self.load_executor(),
            backend,
            self.debug,
            self.metrics,
        ))
    }
}

fn root_name(spec: &QuerySpec) -> &'static str {
    spec.sources().first().map_or("", |source| source.name())
}
