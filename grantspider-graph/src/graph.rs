use std::sync::Arc;
use std::time::Instant;

use ahash::AHashMap;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::program::{EdgeKind, GraphProgram, NodeKind, END, START};
use crate::stream::timestamp_ms;
use crate::{
    Checkpoint, Checkpointer, ExecutionConfig, ExecutionOptions, GraphError, GraphEvent,
    GraphNode, GraphState, Observer, Route, Router, StateSchema,
};

enum Node<S: StateSchema> {
    Worker(Box<dyn GraphNode<S>>),
    Router(Box<dyn Router<S>>),
}

type EventSender<S> = mpsc::Sender<Result<GraphEvent<S>, GraphError>>;

pub struct GraphBuilder<S: StateSchema> {
    nodes: AHashMap<String, Node<S>>,
    order: Vec<String>,
    edges: AHashMap<String, String>,
    entry: Option<String>,
    config: ExecutionConfig,
    checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    observer: Option<Arc<dyn Observer>>,
}

impl<S: StateSchema> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSchema> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: AHashMap::new(),
            order: Vec::new(),
            edges: AHashMap::new(),
            entry: None,
            config: ExecutionConfig::default(),
            checkpointer: None,
            observer: None,
        }
    }

    fn insert(mut self, name: &str, node: Node<S>) -> Self {
        if self.nodes.insert(name.to_string(), node).is_none() {
            self.order.push(name.to_string());
        }
        self
    }

    pub fn add_node<N>(self, name: &str, node: N) -> Self
    where
        N: GraphNode<S> + 'static,
    {
        self.insert(name, Node::Worker(Box::new(node)))
    }

    pub fn add_router<R>(self, name: &str, router: R) -> Self
    where
        R: Router<S> + 'static,
    {
        self.insert(name, Node::Router(Box::new(router)))
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges.insert(from.to_string(), to.to_string());
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn with_default_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_checkpointer<C>(mut self, checkpointer: C) -> Self
    where
        C: Checkpointer<S> + 'static,
    {
        self.checkpointer = Some(Arc::new(checkpointer));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<ExecutableGraph<S>, GraphError> {
        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::MissingNode { node: entry });
        }
        for (from, to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::MissingNode { node: from.clone() });
            }
            if !self.nodes.contains_key(to) {
                return Err(GraphError::InvalidEdge { node: to.clone() });
            }
        }
        for name in &self.order {
            match self.nodes.get(name) {
                Some(Node::Router(router)) => {
                    if self.edges.contains_key(name) {
                        return Err(GraphError::InvalidEdge { node: name.clone() });
                    }
                    for target in router.targets() {
                        if !self.nodes.contains_key(&target) {
                            return Err(GraphError::InvalidEdge { node: target });
                        }
                    }
                }
                Some(Node::Worker(_)) | None => {}
            }
        }

        Ok(ExecutableGraph {
            nodes: self.nodes,
            order: self.order,
            edges: self.edges,
            entry,
            config: self.config,
            checkpointer: self.checkpointer,
            observer: self.observer,
        })
    }
}

pub struct ExecutableGraph<S: StateSchema> {
    nodes: AHashMap<String, Node<S>>,
    order: Vec<String>,
    edges: AHashMap<String, String>,
    entry: String,
    config: ExecutionConfig,
    checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    observer: Option<Arc<dyn Observer>>,
}

impl<S: StateSchema> ExecutableGraph<S> {
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub async fn invoke_graph(&self, state: GraphState<S>) -> Result<GraphState<S>, GraphError> {
        self.invoke_graph_with_options(state, ExecutionOptions::default())
            .await
    }

    pub async fn invoke_graph_with_options(
        &self,
        state: GraphState<S>,
        options: ExecutionOptions,
    ) -> Result<GraphState<S>, GraphError> {
        self.execute(state, options, None).await
    }

    /// Runs the graph and yields its events as they happen. The stream ends
    /// with `Completed`, or with the error that stopped the run.
    pub fn stream_invoke(
        &self,
        state: GraphState<S>,
        options: ExecutionOptions,
    ) -> BoxStream<'_, Result<GraphEvent<S>, GraphError>> {
        let buffer = self.config.merge(&options).event_buffer;
        let (tx, rx) = mpsc::channel(buffer);
        let run = async move {
            if let Err(error) = self.execute(state, options, Some(tx.clone())).await {
                let _ = tx.send(Err(error)).await;
            }
            None
        };
        stream::select(
            ReceiverStream::new(rx),
            stream::once(run).filter_map(futures::future::ready),
        )
        .boxed()
    }

    pub fn program(&self) -> GraphProgram {
        let mut program = GraphProgram::new();
        for name in &self.order {
            let kind = match self.nodes.get(name) {
                Some(Node::Router(_)) => NodeKind::Router,
                _ => NodeKind::Worker,
            };
            program.add_node(name, kind);
        }
        program.add_edge(START, &self.entry, EdgeKind::Default);
        for name in &self.order {
            match self.nodes.get(name) {
                Some(Node::Router(router)) => {
                    for target in router.targets() {
                        program.add_edge(name, &target, EdgeKind::Conditional);
                    }
                    program.add_edge(name, END, EdgeKind::Conditional);
                }
                _ => match self.edges.get(name) {
                    Some(next) => program.add_edge(name, next, EdgeKind::Default),
                    None => program.add_edge(name, END, EdgeKind::Default),
                },
            }
        }
        program
    }

    async fn execute(
        &self,
        mut state: GraphState<S>,
        options: ExecutionOptions,
        events: Option<EventSender<S>>,
    ) -> Result<GraphState<S>, GraphError> {
        let config = self.config.merge(&options);
        let thread_id = options.thread_id;
        let mut attempts: AHashMap<String, usize> = AHashMap::new();
        let mut current = Some(self.entry.clone());
        let mut step = 0usize;

        while let Some(name) = current.take() {
            if let Some(max) = config.max_steps {
                if step >= max {
                    return Err(GraphError::MaxStepsExceeded {
                        max,
                        reached: step + 1,
                    });
                }
            }
            step += 1;

            let node = self
                .nodes
                .get(&name)
                .ok_or_else(|| GraphError::MissingNode { node: name.clone() })?;
            let span = tracing::info_span!("graph_node", node = %name, step);

            match node {
                Node::Router(router) => {
                    let route = span.in_scope(|| router.route(&state))?;
                    tracing::debug!(router = %name, target = ?route, "routed");
                    emit(
                        &events,
                        GraphEvent::Routed {
                            router: name.clone(),
                            target: route.clone(),
                        },
                    )
                    .await;
                    current = match route {
                        Route::Node(next) if self.nodes.contains_key(&next) => Some(next),
                        Route::Node(next) => return Err(GraphError::InvalidEdge { node: next }),
                        Route::End => None,
                    };
                }
                Node::Worker(worker) => {
                    let counter = attempts.entry(name.clone()).or_insert(0);
                    *counter += 1;
                    let attempt = *counter;
                    if attempt > config.max_node_attempts {
                        return Err(GraphError::AttemptsExhausted {
                            node: name,
                            attempts: config.max_node_attempts,
                        });
                    }

                    emit(
                        &events,
                        GraphEvent::NodeEnter {
                            node: name.clone(),
                            step,
                            timestamp: timestamp_ms(),
                        },
                    )
                    .await;
                    if let Some(observer) = &self.observer {
                        observer.on_node_start(&name, &to_value(&state)).await;
                    }

                    let started = Instant::now();
                    let result = worker.invoke(state.clone()).instrument(span).await;
                    let duration_ms = started.elapsed().as_millis();

                    match result {
                        Ok(update) => {
                            state = state.apply(update);
                            if let Some(observer) = &self.observer {
                                observer
                                    .on_node_end(&name, &to_value(&state), duration_ms)
                                    .await;
                            }
                            emit(
                                &events,
                                GraphEvent::NodeExit {
                                    node: name.clone(),
                                    step,
                                    state: state.clone(),
                                    duration_ms,
                                },
                            )
                            .await;
                            self.checkpoint(&thread_id, &state, step, &name, &events)
                                .await?;
                        }
                        Err(error) => {
                            tracing::warn!(node = %name, attempt, error = %error, "node failed");
                            if let Some(observer) = &self.observer {
                                observer.on_error(&name, &error).await;
                            }
                            emit(
                                &events,
                                GraphEvent::NodeError {
                                    node: name.clone(),
                                    attempt,
                                    error: error.to_string(),
                                },
                            )
                            .await;
                            if attempt >= config.max_node_attempts
                                || !self.edges.contains_key(&name)
                            {
                                return Err(GraphError::NodeFailed {
                                    node: name,
                                    attempts: attempt,
                                    source: error.into_boxed(),
                                });
                            }
                        }
                    }

                    current = self.edges.get(&name).cloned();
                }
            }
        }

        self.checkpoint(&thread_id, &state, step, END, &events).await?;
        emit(
            &events,
            GraphEvent::Completed {
                state: state.clone(),
            },
        )
        .await;
        Ok(state)
    }

    async fn checkpoint(
        &self,
        thread_id: &Option<String>,
        state: &GraphState<S>,
        step: usize,
        node: &str,
        events: &Option<EventSender<S>>,
    ) -> Result<(), GraphError> {
        let (Some(checkpointer), Some(thread_id)) = (&self.checkpointer, thread_id) else {
            return Ok(());
        };
        let checkpoint = Checkpoint::new(thread_id.clone(), state.clone(), step, node.to_string());
        checkpointer.save(&checkpoint).await?;
        emit(
            events,
            GraphEvent::CheckpointSaved {
                node: node.to_string(),
                step,
            },
        )
        .await;
        Ok(())
    }
}

async fn emit<S: StateSchema>(events: &Option<EventSender<S>>, event: GraphEvent<S>) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening any more.
        let _ = tx.send(Ok(event)).await;
    }
}

fn to_value<S: StateSchema>(state: &GraphState<S>) -> Value {
    serde_json::to_value(&state.data).unwrap_or(Value::Null)
}
