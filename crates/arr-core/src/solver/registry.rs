use super::MipBackend;
use crate::error::ArrangementError;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, RwLock},
};

type BackendConstructor = fn() -> Arc<dyn MipBackend>;

struct BackendEntry {
    canonical: &'static str,
    constructor: BackendConstructor,
}

struct BackendRegistry {
    entries: HashMap<String, BackendEntry>,
}

impl BackendRegistry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn register(&mut self, name: &'static str, constructor: BackendConstructor) -> bool {
        let entry = BackendEntry {
            canonical: name,
            constructor,
        };
        self.entries
            .insert(name.to_ascii_lowercase(), entry)
            .is_none()
    }

    fn entry_for(&self, name: &str) -> Option<&BackendEntry> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    fn constructor_for(&self, canonical: &'static str) -> Option<BackendConstructor> {
        self.entries
            .values()
            .find(|entry| entry.canonical == canonical)
            .map(|entry| entry.constructor)
    }

    fn available(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.entries.values().map(|entry| entry.canonical).collect();
        names.sort_unstable();
        names
    }
}

static GLOBAL_BACKEND_REGISTRY: Lazy<RwLock<BackendRegistry>> =
    Lazy::new(|| RwLock::new(BackendRegistry::new()));

/// Registers a backend constructor under `name`. Concrete backend crates
/// (e.g. `arr-solver-goodlp`) call this once, typically from a `ctor`-free
/// explicit setup step since the engine itself never links a concrete
/// solver.
pub fn register_solver(name: &'static str, constructor: BackendConstructor) -> bool {
    let mut registry = GLOBAL_BACKEND_REGISTRY
        .write()
        .expect("solver registry lock poisoned");
    registry.register(name, constructor)
}

/// Builds a fresh model from the backend identified by `kind`.
pub fn build_solver(kind: &SolverKind) -> Arc<dyn MipBackend> {
    let registry = GLOBAL_BACKEND_REGISTRY
        .read()
        .expect("solver registry lock poisoned");
    registry
        .constructor_for(kind.0)
        .map(|constructor| constructor())
        .expect("solver constructor missing for registered kind")
}

/// A validated, registered solver backend name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverKind(&'static str);

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn available() -> Vec<&'static str> {
        let registry = GLOBAL_BACKEND_REGISTRY
            .read()
            .expect("solver registry lock poisoned");
        registry.available()
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for SolverKind {
    type Err = ArrangementError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let registry = GLOBAL_BACKEND_REGISTRY
            .read()
            .expect("solver registry lock poisoned");
        if let Some(entry) = registry.entry_for(input) {
            Ok(SolverKind(entry.canonical))
        } else {
            Err(ArrangementError::Configuration(format!(
                "unknown solver backend '{}'; supported values: {}",
                input,
                registry.available().join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{MipModel, MipSolution, SolveStatus};

    struct StubSolution;
    impl MipSolution for StubSolution {
        fn status(&self) -> SolveStatus {
            SolveStatus::Optimal
        }
        fn objective_value(&self) -> f64 {
            0.0
        }
        fn value(&self, _var: usize) -> f64 {
            0.0
        }
    }

    struct StubModel;
    impl MipModel for StubModel {
        fn add_variable(&mut self, _spec: crate::solver::VarSpec) -> usize {
            0
        }
        fn add_constraint(&mut self, _row: crate::solver::SparseRow) {}
        fn set_objective(&mut self, _coefficients: &[(usize, f64)]) {}
        fn solve(self: Box<Self>) -> crate::error::ArrangementResult<Box<dyn MipSolution>> {
            Ok(Box::new(StubSolution))
        }
    }

    struct StubBackend;
    impl MipBackend for StubBackend {
        fn new_model(&self) -> Box<dyn MipModel> {
            Box::new(StubModel)
        }
    }

    #[test]
    fn registering_and_resolving_a_backend_round_trips() {
        register_solver("stub", || Arc::new(StubBackend));
        let kind: SolverKind = "stub".parse().unwrap();
        assert_eq!(kind.as_str(), "stub");
        let backend = build_solver(&kind);
        let model = backend.new_model();
        assert!(model.solve().unwrap().status().is_success());
    }

    #[test]
    fn unknown_backend_name_reports_available_list() {
        register_solver("stub2", || Arc::new(StubBackend));
        let err = "missing".parse::<SolverKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("supported values"));
    }
}
