use crate::error::StoreError;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use navtree_traits::{FetchError, SubtreeFetcher};
use navtree_types::{Node, NodeChildren, NodePath, NodeView, PayloadError, decode_subtree};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type NodeId = usize;

#[derive(Debug)]
struct Slot {
    label: String,
    target: Option<String>,
    children: SlotChildren,
}

#[derive(Debug)]
enum SlotChildren {
    Loaded(Vec<NodeId>),
    Deferred(String),
}

#[derive(Debug, Clone)]
enum FlightError {
    Fetch(FetchError),
    Malformed(PayloadError),
}

type FlightOutcome = Result<Arc<Vec<Node>>, FlightError>;

/// One in-flight fetch, shared by every caller expanding the same token.
#[derive(Clone)]
struct Flight {
    id: u64,
    future: Shared<BoxFuture<'static, FlightOutcome>>,
}

#[derive(Default)]
struct StoreState {
    arena: Vec<Slot>,
    roots: Vec<NodeId>,
    expanded: HashSet<NodeId>,
    /// Decoded payloads by token. Tokens shared by several nodes are fetched once.
    resolved: HashMap<String, Arc<Vec<Node>>>,
    in_flight: HashMap<String, Flight>,
    next_flight: u64,
}

/// The navigation hierarchy of one session.
///
/// All methods take `&self`; the state sits behind a mutex that is never held
/// across the fetch, so concurrent expansions can join the same flight.
pub struct TreeStore {
    fetcher: Arc<dyn SubtreeFetcher>,
    state: Mutex<StoreState>,
}

impl fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TreeStore")
            .field("fetcher", &self.fetcher.name())
            .field("nodes", &state.arena.len())
            .field("expanded", &state.expanded.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl TreeStore {
    /// Builds the store from the root payload. Order is preserved as given.
    pub fn new(root: Vec<Node>, fetcher: Arc<dyn SubtreeFetcher>) -> Self {
        let mut state = StoreState::default();
        let roots = root.iter().map(|node| state.insert(node)).collect();
        state.roots = roots;
        log::debug!(
            "Tree store initialised with {} root nodes ({} materialized) using {}",
            state.roots.len(),
            state.arena.len(),
            fetcher.name()
        );
        Self {
            fetcher,
            state: Mutex::new(state),
        }
    }

    /// The current root list. Unresolved subtrees appear as `NodeChildren::Reference`.
    pub fn get_root(&self) -> Vec<Node> {
        let state = self.lock();
        state.roots.iter().map(|&id| state.snapshot(id)).collect()
    }

    /// Expands the node at `path`, fetching its subtree first if needed.
    ///
    /// Returns the node's children. On `StoreError::Fetch` the node is left
    /// unresolved and collapsed so the call can be retried.
    pub async fn expand(&self, path: &[usize]) -> Result<Vec<Node>, StoreError> {
        let children = self.resolve(path).await?;
        let mut state = self.lock();
        let id = state.locate(path)?;
        state.expanded.insert(id);
        Ok(children)
    }

    /// Loads the children at `path` without changing whether the node is expanded.
    ///
    /// Shares the subtree cache and in-flight fetches with [`TreeStore::expand`].
    pub async fn resolve(&self, path: &[usize]) -> Result<Vec<Node>, StoreError> {
        let (token, flight) = {
            let mut state = self.lock();
            let id = state.locate(path)?;
            let deferred = match &state.arena[id].children {
                SlotChildren::Loaded(_) => None,
                SlotChildren::Deferred(token) => Some(token.clone()),
            };
            let Some(token) = deferred else {
                return Ok(state.children_of(id));
            };
            if let Some(nodes) = state.resolved.get(&token).cloned() {
                log::debug!("Subtree '{}' served from cache", token);
                state.attach(id, &nodes);
                return Ok(state.children_of(id));
            }
            let flight = state.flight_for(&token, &self.fetcher);
            (token, flight)
        };

        let outcome = flight.future.await;

        let mut state = self.lock();
        state.finish_flight(&token, flight.id);
        let id = state.locate(path)?;
        match outcome {
            Ok(nodes) => {
                state
                    .resolved
                    .entry(token)
                    .or_insert_with(|| Arc::clone(&nodes));
                if state.is_deferred(id) {
                    state.attach(id, &nodes);
                }
                Ok(state.children_of(id))
            }
            Err(FlightError::Fetch(source)) => {
                log::warn!("Fetching subtree '{}' failed: {}", token, source);
                Err(StoreError::Fetch { token, source })
            }
            Err(FlightError::Malformed(source)) => {
                log::warn!(
                    "Subtree '{}' is malformed, showing it as a leaf: {}",
                    token,
                    source
                );
                state
                    .resolved
                    .entry(token.clone())
                    .or_insert_with(|| Arc::new(Vec::new()));
                if state.is_deferred(id) {
                    state.arena[id].children = SlotChildren::Loaded(Vec::new());
                }
                Err(StoreError::MalformedSubtree { token, source })
            }
        }
    }

    /// Marks the node collapsed. Resolved children are kept.
    pub fn collapse(&self, path: &[usize]) -> Result<(), StoreError> {
        let mut state = self.lock();
        let id = state.locate(path)?;
        state.expanded.remove(&id);
        Ok(())
    }

    pub fn is_expanded(&self, path: &[usize]) -> Result<bool, StoreError> {
        let state = self.lock();
        let id = state.locate(path)?;
        Ok(state.expanded.contains(&id))
    }

    /// Depth-first, pre-order search over materialized nodes for the first
    /// node whose target equals `fragment`.
    pub fn find_path_for(&self, fragment: &str) -> Option<NodePath> {
        let state = self.lock();
        let mut path = Vec::new();
        state
            .search(&state.roots, fragment, &mut path)
            .then_some(path)
    }

    /// The first unresolved node in pre-order, ignoring the paths in `skip`.
    pub fn next_deferred(&self, skip: &[NodePath]) -> Option<NodePath> {
        let state = self.lock();
        let mut path = Vec::new();
        state
            .first_deferred(&state.roots, skip, &mut path)
            .then_some(path)
    }

    /// Snapshot of the node at `path`.
    pub fn node(&self, path: &[usize]) -> Result<Node, StoreError> {
        let state = self.lock();
        let id = state.locate(path)?;
        Ok(state.snapshot(id))
    }

    /// The subtree token at `path`, or `None` once the node is resolved.
    pub fn reference(&self, path: &[usize]) -> Result<Option<String>, StoreError> {
        let state = self.lock();
        let id = state.locate(path)?;
        Ok(match &state.arena[id].children {
            SlotChildren::Deferred(token) => Some(token.clone()),
            SlotChildren::Loaded(_) => None,
        })
    }

    pub fn node_view(&self, path: &[usize]) -> Result<NodeView, StoreError> {
        let state = self.lock();
        let id = state.locate(path)?;
        Ok(state.view(id))
    }

    /// Views of the children at `path`; empty while the subtree is unresolved.
    pub fn children_views(&self, path: &[usize]) -> Result<Vec<NodeView>, StoreError> {
        let state = self.lock();
        let id = state.locate(path)?;
        Ok(match &state.arena[id].children {
            SlotChildren::Loaded(children) => children.iter().map(|&c| state.view(c)).collect(),
            SlotChildren::Deferred(_) => Vec::new(),
        })
    }

    pub fn root_views(&self) -> Vec<NodeView> {
        let state = self.lock();
        state.roots.iter().map(|&id| state.view(id)).collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Every mutation completes under the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreState {
    fn insert(&mut self, node: &Node) -> NodeId {
        let children = match &node.children {
            NodeChildren::Nodes(children) => {
                SlotChildren::Loaded(children.iter().map(|child| self.insert(child)).collect())
            }
            NodeChildren::Reference(token) => SlotChildren::Deferred(token.clone()),
        };
        self.arena.push(Slot {
            label: node.label.clone(),
            target: node.target.clone(),
            children,
        });
        self.arena.len() - 1
    }

    fn attach(&mut self, id: NodeId, nodes: &[Node]) {
        let children = nodes.iter().map(|node| self.insert(node)).collect();
        self.arena[id].children = SlotChildren::Loaded(children);
    }

    fn is_deferred(&self, id: NodeId) -> bool {
        matches!(self.arena[id].children, SlotChildren::Deferred(_))
    }

    fn locate(&self, path: &[usize]) -> Result<NodeId, StoreError> {
        let invalid = |depth| StoreError::InvalidPath {
            path: path.to_vec(),
            depth,
        };
        let (&first, rest) = path.split_first().ok_or_else(|| invalid(0))?;
        let mut id = *self.roots.get(first).ok_or_else(|| invalid(0))?;
        for (offset, &index) in rest.iter().enumerate() {
            let depth = offset + 1;
            id = match &self.arena[id].children {
                SlotChildren::Loaded(children) => {
                    *children.get(index).ok_or_else(|| invalid(depth))?
                }
                SlotChildren::Deferred(_) => return Err(invalid(depth)),
            };
        }
        Ok(id)
    }

    fn flight_for(&mut self, token: &str, fetcher: &Arc<dyn SubtreeFetcher>) -> Flight {
        if let Some(flight) = self.in_flight.get(token) {
            log::debug!("Joining in-flight fetch of subtree '{}'", token);
            return flight.clone();
        }

        let id = self.next_flight;
        self.next_flight += 1;
        let fetcher = Arc::clone(fetcher);
        let owned = token.to_string();
        let future = async move {
            log::debug!("Fetching subtree '{}' via {}", owned, fetcher.name());
            let payload = fetcher.fetch(&owned).await.map_err(FlightError::Fetch)?;
            let nodes = decode_subtree(&payload).map_err(FlightError::Malformed)?;
            Ok(Arc::new(nodes))
        }
        .boxed()
        .shared();

        let flight = Flight { id, future };
        self.in_flight.insert(token.to_string(), flight.clone());
        flight
    }

    fn finish_flight(&mut self, token: &str, id: u64) {
        if self.in_flight.get(token).is_some_and(|f| f.id == id) {
            self.in_flight.remove(token);
        }
    }

    fn search(&self, ids: &[NodeId], fragment: &str, path: &mut NodePath) -> bool {
        for (index, &id) in ids.iter().enumerate() {
            path.push(index);
            let slot = &self.arena[id];
            if slot.target.as_deref() == Some(fragment) {
                return true;
            }
            if let SlotChildren::Loaded(children) = &slot.children
                && self.search(children, fragment, path)
            {
                return true;
            }
            path.pop();
        }
        false
    }

    fn first_deferred(&self, ids: &[NodeId], skip: &[NodePath], path: &mut NodePath) -> bool {
        for (index, &id) in ids.iter().enumerate() {
            path.push(index);
            match &self.arena[id].children {
                SlotChildren::Deferred(_) if !skip.contains(path) => return true,
                SlotChildren::Deferred(_) => {}
                SlotChildren::Loaded(children) => {
                    if self.first_deferred(children, skip, path) {
                        return true;
                    }
                }
            }
            path.pop();
        }
        false
    }

    fn snapshot(&self, id: NodeId) -> Node {
        let slot = &self.arena[id];
        Node {
            label: slot.label.clone(),
            target: slot.target.clone(),
            children: match &slot.children {
                SlotChildren::Loaded(children) => {
                    NodeChildren::Nodes(children.iter().map(|&c| self.snapshot(c)).collect())
                }
                SlotChildren::Deferred(token) => NodeChildren::Reference(token.clone()),
            },
        }
    }

    fn children_of(&self, id: NodeId) -> Vec<Node> {
        match &self.arena[id].children {
            SlotChildren::Loaded(children) => children.iter().map(|&c| self.snapshot(c)).collect(),
            SlotChildren::Deferred(_) => Vec::new(),
        }
    }

    fn view(&self, id: NodeId) -> NodeView {
        let slot = &self.arena[id];
        NodeView {
            label: slot.label.clone(),
            target: slot.target.clone(),
            expanded: self.expanded.contains(&id),
            child_count: match &slot.children {
                SlotChildren::Loaded(children) => Some(children.len()),
                SlotChildren::Deferred(_) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use navtree_traits::{InMemorySubtreeFetcher, SharedPayload};

    /// Yields once before answering so that concurrent callers overlap.
    #[derive(Debug, Default)]
    struct SlowFetcher {
        inner: InMemorySubtreeFetcher,
    }

    #[async_trait]
    impl SubtreeFetcher for SlowFetcher {
        async fn fetch(&self, token: &str) -> Result<SharedPayload, FetchError> {
            tokio::task::yield_now().await;
            self.inner.fetch(token).await
        }

        fn name(&self) -> &'static str {
            "SlowFetcher"
        }
    }

    fn scenario_store() -> (TreeStore, Arc<InMemorySubtreeFetcher>) {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        fetcher
            .add_nodes("ref1", &[Node::leaf("B", Some("b.html"))])
            .unwrap();
        let store = TreeStore::new(vec![Node::deferred("A", None, "ref1")], fetcher.clone());
        (store, fetcher)
    }

    #[test]
    fn test_root_order_preserved() {
        let root = vec![
            Node::leaf("Overview", Some("index.html")),
            Node::leaf("Upgrading", Some("upgrading.html")),
            Node::deferred("Modules", Some("modules.html"), "modules"),
            Node::with_children("Files", None, vec![Node::leaf("File List", Some("files.html"))]),
        ];
        let store = TreeStore::new(root.clone(), Arc::new(InMemorySubtreeFetcher::new()));
        assert_eq!(store.get_root(), root);
    }

    #[tokio::test]
    async fn test_expand_collapse_reexpand_uses_cache() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (store, fetcher) = scenario_store();

        let children = store.expand(&[0]).await.unwrap();
        assert_eq!(children, vec![Node::leaf("B", Some("b.html"))]);
        assert!(store.is_expanded(&[0]).unwrap());

        store.collapse(&[0]).unwrap();
        assert!(!store.is_expanded(&[0]).unwrap());

        let again = store.expand(&[0]).await.unwrap();
        assert_eq!(again, children);
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(store.get_root()[0].child_count(), Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_expand_is_single_flight() {
        let fetcher = Arc::new(SlowFetcher::default());
        fetcher
            .inner
            .add_nodes("ref1", &[Node::leaf("B", Some("b.html")), Node::leaf("C", None)])
            .unwrap();
        let store = TreeStore::new(vec![Node::deferred("A", None, "ref1")], fetcher.clone());

        let (first, second) = tokio::join!(store.expand(&[0]), store.expand(&[0]));

        assert_eq!(fetcher.inner.fetch_count(), 1);
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(store.get_root()[0].child_count(), Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_failure_reaches_every_waiter() {
        let fetcher = Arc::new(SlowFetcher::default());
        let store = TreeStore::new(vec![Node::deferred("A", None, "gone")], fetcher.clone());

        let (first, second) = tokio::join!(store.expand(&[0]), store.expand(&[0]));

        assert_eq!(fetcher.inner.fetch_count(), 1);
        assert!(matches!(first, Err(StoreError::Fetch { .. })));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_node_retryable() {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        let store = TreeStore::new(vec![Node::deferred("A", None, "ref1")], fetcher.clone());

        let err = store.expand(&[0]).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Fetch {
                token: "ref1".to_string(),
                source: FetchError::NotFound("ref1".to_string()),
            }
        );
        assert!(!store.is_expanded(&[0]).unwrap());
        assert_eq!(store.get_root()[0].reference(), Some("ref1"));

        fetcher.add("ref1", r#"[["B", "b.html", null]]"#).unwrap();
        assert_eq!(store.expand(&[0]).await.unwrap().len(), 1);
        assert!(store.is_expanded(&[0]).unwrap());
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_subtree_becomes_leaf() {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        fetcher.add("bad", r#"[{"target": "x.html"}]"#).unwrap();
        let store = TreeStore::new(
            vec![Node::deferred("Bad", None, "bad"), Node::leaf("Good", Some("g.html"))],
            fetcher.clone(),
        );

        let err = store.expand(&[0]).await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedSubtree { ref token, .. } if token == "bad"));
        assert_eq!(store.get_root()[0].child_count(), Some(0));

        assert!(store.expand(&[0]).await.unwrap().is_empty());
        assert!(store.expand(&[1]).await.unwrap().is_empty());
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_subtree_is_valid() {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        fetcher.add("empty", "var empty = [];").unwrap();
        let store = TreeStore::new(vec![Node::deferred("Empty", None, "empty")], fetcher);

        assert!(store.expand(&[0]).await.unwrap().is_empty());
        assert!(store.is_expanded(&[0]).unwrap());
        assert_eq!(store.node_view(&[0]).unwrap().child_count, Some(0));
    }

    #[tokio::test]
    async fn test_invalid_paths() {
        let (store, _) = scenario_store();

        assert_eq!(
            store.expand(&[3]).await.unwrap_err(),
            StoreError::InvalidPath { path: vec![3], depth: 0 }
        );
        assert!(matches!(store.collapse(&[]), Err(StoreError::InvalidPath { depth: 0, .. })));
        // [0, 0] runs through an unresolved reference.
        assert_eq!(
            store.is_expanded(&[0, 0]).unwrap_err(),
            StoreError::InvalidPath { path: vec![0, 0], depth: 1 }
        );

        store.expand(&[0]).await.unwrap();
        assert!(!store.is_expanded(&[0, 0]).unwrap());
        assert!(matches!(
            store.is_expanded(&[0, 1]),
            Err(StoreError::InvalidPath { depth: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_shared_token_fetched_once() {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        fetcher.add("annotated_dup", r#"[["netbuf", "structnetbuf.html", null]]"#).unwrap();
        let store = TreeStore::new(
            vec![
                Node::deferred("Data Structures", Some("annotated.html"), "annotated_dup"),
                Node::deferred("Classes", Some("annotated.html"), "annotated_dup"),
            ],
            fetcher.clone(),
        );

        let first = store.expand(&[0]).await.unwrap();
        let second = store.expand(&[1]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_find_path_for_is_depth_first() {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        fetcher
            .add("globals", r#"[["Functions", "globals_func.html", null]]"#)
            .unwrap();
        let store = TreeStore::new(
            vec![
                Node::with_children(
                    "Data Structures",
                    Some("annotated.html"),
                    vec![
                        Node::leaf("Data Fields", Some("functions.html")),
                        Node::leaf("Again", Some("files.html")),
                    ],
                ),
                Node::with_children(
                    "Files",
                    None,
                    vec![
                        Node::leaf("File List", Some("files.html")),
                        Node::deferred("Globals", Some("globals.html"), "globals"),
                    ],
                ),
            ],
            fetcher,
        );

        assert_eq!(store.find_path_for("annotated.html"), Some(vec![0]));
        assert_eq!(store.find_path_for("files.html"), Some(vec![0, 1]));
        assert_eq!(store.find_path_for("globals.html"), Some(vec![1, 1]));
        assert_eq!(store.find_path_for("globals_func.html"), None);

        store.expand(&[1, 1]).await.unwrap();
        assert_eq!(store.find_path_for("globals_func.html"), Some(vec![1, 1, 0]));
        assert_eq!(store.find_path_for("missing.html"), None);
    }

    #[tokio::test]
    async fn test_views_report_expand_state() {
        let (store, _) = scenario_store();

        let before = store.root_views();
        assert_eq!(before[0].child_count, None);
        assert!(!before[0].expanded);
        assert!(store.children_views(&[0]).unwrap().is_empty());

        store.expand(&[0]).await.unwrap();
        let view = store.node_view(&[0]).unwrap();
        assert!(view.expanded);
        assert_eq!(view.child_count, Some(1));
        assert_eq!(store.children_views(&[0]).unwrap()[0].target.as_deref(), Some("b.html"));
        assert_eq!(store.node(&[0, 0]).unwrap().label, "B");
    }

    #[tokio::test]
    async fn test_reference_cleared_after_resolution() {
        let (store, _) = scenario_store();
        assert_eq!(store.reference(&[0]).unwrap().as_deref(), Some("ref1"));

        store.expand(&[0]).await.unwrap();
        assert_eq!(store.reference(&[0]).unwrap(), None);
        assert_eq!(store.reference(&[0, 0]).unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_loads_without_expanding() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (store, fetcher) = scenario_store();

        let children = store.resolve(&[0]).await.unwrap();
        assert_eq!(children, vec![Node::leaf("B", Some("b.html"))]);
        assert!(!store.is_expanded(&[0]).unwrap());
        assert_eq!(store.find_path_for("b.html"), Some(vec![0, 0]));

        store.expand(&[0]).await.unwrap();
        assert!(store.is_expanded(&[0]).unwrap());
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_next_deferred_is_pre_order_and_honours_skip() {
        let fetcher = Arc::new(InMemorySubtreeFetcher::new());
        fetcher
            .add_nodes("inner", &[Node::deferred("Nested", None, "nested")])
            .unwrap();
        let store = TreeStore::new(
            vec![
                Node::leaf("Overview", Some("index.html")),
                Node::with_children("Group", None, vec![Node::deferred("Inner", None, "inner")]),
                Node::deferred("Later", None, "later"),
            ],
            fetcher,
        );

        assert_eq!(store.next_deferred(&[]), Some(vec![1, 0]));
        assert_eq!(store.next_deferred(&[vec![1, 0]]), Some(vec![2]));

        store.resolve(&[1, 0]).await.unwrap();
        assert_eq!(store.next_deferred(&[]), Some(vec![1, 0, 0]));
        assert_eq!(store.next_deferred(&[vec![1, 0, 0], vec![2]]), None);
    }
}
