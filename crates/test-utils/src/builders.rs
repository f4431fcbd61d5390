#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use testherd::config::RunConfig;
use testherd::task::TestCase;
use testherd::types::{BoxFuture, ResourceName};

/// Shared record of which scripted cases ran, and how many overlapped.
#[derive(Clone, Default)]
pub struct ConcurrencyProbe {
    inner: Arc<Mutex<ProbeState>>,
}

#[derive(Default)]
struct ProbeState {
    current: usize,
    max: usize,
    started: Vec<String>,
    finished: Vec<String>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest number of bodies observed running at the same time.
    pub fn max(&self) -> usize {
        self.inner.lock().unwrap().max
    }

    pub fn current(&self) -> usize {
        self.inner.lock().unwrap().current
    }

    /// Names in the order their bodies started.
    pub fn started(&self) -> Vec<String> {
        self.inner.lock().unwrap().started.clone()
    }

    /// Names in the order their bodies returned (panics included).
    pub fn finished(&self) -> Vec<String> {
        self.inner.lock().unwrap().finished.clone()
    }

    fn enter(&self, name: &str) -> ProbeGuard {
        let mut state = self.inner.lock().unwrap();
        state.current += 1;
        state.max = state.max.max(state.current);
        state.started.push(name.to_string());
        ProbeGuard {
            probe: self.clone(),
            name: name.to_string(),
        }
    }
}

/// Leaves the probe on drop, so panicking bodies are accounted for too.
struct ProbeGuard {
    probe: ConcurrencyProbe,
    name: String,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        let mut state = self.probe.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.current -= 1;
        state.finished.push(std::mem::take(&mut self.name));
    }
}

#[derive(Clone, Debug)]
enum Script {
    Pass,
    Fail(String),
    Panic(String),
}

/// Test case whose behaviour is fixed up front by a [`CaseBuilder`].
#[derive(Clone)]
pub struct ScriptedCase {
    name: String,
    id: Option<String>,
    resources: Vec<ResourceName>,
    delay: Duration,
    script: Script,
    skip: bool,
    expected_to_fail: bool,
    probe: Option<ConcurrencyProbe>,
}

impl TestCase for ScriptedCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    fn run<'a>(&'a self, _config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let _guard = self.probe.as_ref().map(|p| p.enter(&self.name));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match &self.script {
                Script::Pass => Ok(()),
                Script::Fail(message) => Err(anyhow::anyhow!("{message}")),
                Script::Panic(message) => panic!("{message}"),
            }
        })
    }

    fn skip(&self, _config: &RunConfig) -> bool {
        self.skip
    }

    fn expected_to_fail(&self, _config: &RunConfig) -> bool {
        self.expected_to_fail
    }

    fn resources(&self) -> Vec<ResourceName> {
        self.resources.clone()
    }
}

/// Builder for [`ScriptedCase`].
pub struct CaseBuilder {
    case: ScriptedCase,
}

impl CaseBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            case: ScriptedCase {
                name: name.to_string(),
                id: None,
                resources: Vec::new(),
                delay: Duration::ZERO,
                script: Script::Pass,
                skip: false,
                expected_to_fail: false,
                probe: None,
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.case.id = Some(id.to_string());
        self
    }

    pub fn resource(mut self, resource: &str) -> Self {
        self.case.resources.push(resource.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.case.delay = Duration::from_millis(ms);
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.case.script = Script::Fail(message.to_string());
        self
    }

    pub fn panic(mut self, message: &str) -> Self {
        self.case.script = Script::Panic(message.to_string());
        self
    }

    pub fn skip(mut self) -> Self {
        self.case.skip = true;
        self
    }

    pub fn expected_to_fail(mut self) -> Self {
        self.case.expected_to_fail = true;
        self
    }

    pub fn probe(mut self, probe: &ConcurrencyProbe) -> Self {
        self.case.probe = Some(probe.clone());
        self
    }

    pub fn build(self) -> Arc<dyn TestCase> {
        Arc::new(self.case)
    }
}

/// A case that passes immediately.
pub fn passing(name: &str) -> Arc<dyn TestCase> {
    CaseBuilder::new(name).build()
}
