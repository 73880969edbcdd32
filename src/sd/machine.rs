use super::timer::LeaseTimer;
use crate::logging::{DiagLogger, LogFacade, LogLevel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::time::Duration;

/// Availability of one remote service as seen by an SD client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientServiceState {
    /// Not looking for the service; left only through an explicit restart.
    Stopped,
    /// Searching: no offer received yet, or the last one lapsed.
    InitialWaitPhase,
    /// Offered, but the client does not currently require it. No lease timer runs.
    ServiceSeen,
    /// Offered and required; the lease timer counts down to expiry.
    ServiceReady,
}

struct MachineCore {
    state: ClientServiceState,
    client_requested: bool,
    activated: bool,
    ttl: Option<Duration>,
    // Identifies the current ServiceReady activation; expiry callbacks carry a copy.
    epoch: u64,
}

struct Shared {
    name: String,
    core: Mutex<MachineCore>,
    ready: Condvar,
    timer: Arc<dyn LeaseTimer>,
    logger: Arc<dyn DiagLogger>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MachineCore> {
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log(&self, level: LogLevel, msg: &str) {
        self.logger.log(level, "SdClient", &format!("[{}] {}", self.name, msg));
    }

    fn transit(self: &Arc<Self>, core: &mut MachineCore, next: ClientServiceState) {
        let previous = core.state;
        if previous == ClientServiceState::ServiceReady {
            self.deactivate(core);
        }

        core.state = next;
        self.log(LogLevel::Debug, &format!("{:?} -> {:?}", previous, next));

        if next == ClientServiceState::ServiceReady {
            self.activate(core);
        }
    }

    fn activate(self: &Arc<Self>, core: &mut MachineCore) {
        core.activated = true;
        if let Some(ttl) = core.ttl {
            self.arm(core, ttl);
        }

        self.ready.notify_all();
    }

    // Starts a new lease: expiries already in flight for older leases become stale.
    fn arm(self: &Arc<Self>, core: &mut MachineCore, ttl: Duration) {
        core.epoch = core.epoch.wrapping_add(1);

        let weak: Weak<Shared> = Arc::downgrade(self);
        let epoch = core.epoch;
        self.timer.set_expiration_callback(Arc::new(move || {
            // The machine may be gone by the time the timer thread gets here
            if let Some(shared) = weak.upgrade() {
                shared.on_lease_expired(epoch);
            }
        }));
        self.timer.reset(ttl);
    }

    fn deactivate(&self, core: &mut MachineCore) {
        self.timer.clear_expiration_callback();
        self.timer.cancel();

        core.client_requested = true;
        core.activated = false;
    }

    fn on_lease_expired(self: &Arc<Self>, epoch: u64) {
        let mut core = self.lock();
        if core.state != ClientServiceState::ServiceReady || core.epoch != epoch {
            self.log(LogLevel::Debug, "ignoring stale lease expiry");
            return;
        }

        self.log(LogLevel::Info, "offer lease expired, service lost");
        self.transit(&mut core, ClientServiceState::InitialWaitPhase);
    }
}

/// Per-service SD client state machine.
///
/// Events arrive from the discovery feed and from the lease timer's thread;
/// consumers may block in [`ServiceAvailabilityMachine::wait_until_ready`].
/// The lease timer runs if and only if the state is `ServiceReady`.
pub struct ServiceAvailabilityMachine {
    shared: Arc<Shared>,
}

impl ServiceAvailabilityMachine {
    pub fn new(name: impl Into<String>, timer: Arc<dyn LeaseTimer>, logger: Arc<dyn DiagLogger>) -> Self {
        ServiceAvailabilityMachine {
            shared: Arc::new(Shared {
                name: name.into(),
                core: Mutex::new(MachineCore {
                    state: ClientServiceState::Stopped,
                    client_requested: true,
                    activated: false,
                    ttl: None,
                    epoch: 0,
                }),
                ready: Condvar::new(),
                timer,
                logger,
            }),
        }
    }

    pub fn with_timer(name: impl Into<String>, timer: Arc<dyn LeaseTimer>) -> Self {
        Self::new(name, timer, LogFacade::new())
    }

    pub fn state(&self) -> ClientServiceState {
        self.shared.lock().state
    }

    pub fn is_available(&self) -> bool {
        self.state() == ClientServiceState::ServiceReady
    }

    pub fn client_requested(&self) -> bool {
        self.shared.lock().client_requested
    }

    pub fn activated(&self) -> bool {
        self.shared.lock().activated
    }

    /// Lease of the most recent offer, if any since the last stop.
    pub fn ttl(&self) -> Option<Duration> {
        self.shared.lock().ttl
    }

    /// Restart discovery: `Stopped` -> `InitialWaitPhase`.
    pub fn start(&self) {
        let mut core = self.shared.lock();
        if core.state == ClientServiceState::Stopped {
            self.shared.transit(&mut core, ClientServiceState::InitialWaitPhase);
        } else {
            self.shared.log(LogLevel::Debug, &format!("start ignored in {:?}", core.state));
        }
    }

    /// An offer (or renewal) with lease `ttl` was received.
    pub fn service_offered(&self, ttl: Duration) {
        let mut core = self.shared.lock();
        match core.state {
            ClientServiceState::Stopped => {
                self.shared.log(LogLevel::Debug, "offer ignored while stopped");
            }
            ClientServiceState::InitialWaitPhase => {
                core.ttl = Some(ttl);
                let next = if core.client_requested {
                    ClientServiceState::ServiceReady
                } else {
                    ClientServiceState::ServiceSeen
                };
                self.shared.transit(&mut core, next);
            }
            ClientServiceState::ServiceSeen => {
                core.ttl = Some(ttl);
            }
            ClientServiceState::ServiceReady => {
                core.ttl = Some(ttl);
                self.shared.arm(&mut core, ttl);
            }
        }
    }

    /// The client starts requiring the service.
    pub fn service_requested(&self) {
        let mut core = self.shared.lock();
        core.client_requested = true;
        if core.state == ClientServiceState::ServiceSeen {
            self.shared.transit(&mut core, ClientServiceState::ServiceReady);
        }
    }

    /// The client no longer requires the service. Before activation this
    /// only records the wish; it takes effect at the next offer.
    pub fn service_not_requested(&self) {
        let mut core = self.shared.lock();
        if core.state == ClientServiceState::ServiceReady && core.activated {
            self.shared.transit(&mut core, ClientServiceState::ServiceSeen);
        } else {
            core.client_requested = false;
        }
    }

    /// The service was withdrawn (Stop Offer).
    pub fn service_stopped(&self) {
        let mut core = self.shared.lock();
        if core.state == ClientServiceState::Stopped {
            return;
        }

        self.shared.timer.cancel();
        core.ttl = None;
        self.shared.transit(&mut core, ClientServiceState::Stopped);
    }

    /// Block until the service is ready or `timeout` elapses.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let core = self.shared.lock();
        let (core, _) = self
            .shared
            .ready
            .wait_timeout_while(core, timeout, |core| core.state != ClientServiceState::ServiceReady)
            .unwrap_or_else(|e| e.into_inner());
        core.state == ClientServiceState::ServiceReady
    }
}

impl Drop for ServiceAvailabilityMachine {
    fn drop(&mut self) {
        let mut core = self.shared.lock();
        // Invalidates expiries that already upgraded their reference
        core.epoch = core.epoch.wrapping_add(1);
        if core.state == ClientServiceState::ServiceReady {
            self.shared.timer.clear_expiration_callback();
            self.shared.timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sd::timer::ManualLeaseTimer;

    fn machine() -> (ServiceAvailabilityMachine, Arc<ManualLeaseTimer>) {
        let timer = ManualLeaseTimer::new();
        let machine = ServiceAvailabilityMachine::with_timer("test", timer.clone());
        machine.start();
        (machine, timer)
    }

    #[test]
    fn test_initial_state() {
        let timer = ManualLeaseTimer::new();
        let machine = ServiceAvailabilityMachine::with_timer("test", timer.clone());
        assert_eq!(machine.state(), ClientServiceState::Stopped);
        assert!(machine.client_requested());
        assert!(!machine.activated());

        machine.service_offered(Duration::from_secs(3));
        assert_eq!(machine.state(), ClientServiceState::Stopped);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_offer_when_requested() {
        let (machine, timer) = machine();
        assert_eq!(machine.state(), ClientServiceState::InitialWaitPhase);

        machine.service_offered(Duration::from_secs(5));
        assert_eq!(machine.state(), ClientServiceState::ServiceReady);
        assert!(machine.activated());
        assert!(timer.is_running());
        assert!(timer.has_callback());
        assert_eq!(timer.duration(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_offer_when_not_requested() {
        let (machine, timer) = machine();
        machine.service_not_requested();
        assert_eq!(machine.state(), ClientServiceState::InitialWaitPhase);
        assert!(!machine.client_requested());

        machine.service_offered(Duration::from_secs(5));
        assert_eq!(machine.state(), ClientServiceState::ServiceSeen);
        assert!(!timer.is_running());
        assert_eq!(timer.duration(), None);

        machine.service_requested();
        assert_eq!(machine.state(), ClientServiceState::ServiceReady);
        assert_eq!(timer.duration(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_expiry_returns_to_initial_wait() {
        let (machine, timer) = machine();
        machine.service_offered(Duration::from_secs(1));

        assert!(timer.expire());
        assert_eq!(machine.state(), ClientServiceState::InitialWaitPhase);
        assert!(!timer.is_running());
        assert!(!timer.has_callback());
        assert!(!machine.activated());
        assert!(machine.client_requested());
    }

    #[test]
    fn test_renewal_resets_lease() {
        let (machine, timer) = machine();
        machine.service_offered(Duration::from_secs(1));
        machine.service_offered(Duration::from_secs(9));

        assert_eq!(machine.state(), ClientServiceState::ServiceReady);
        assert_eq!(timer.duration(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_renewal_outruns_pending_expiry() {
        let (machine, timer) = machine();
        machine.service_offered(Duration::from_secs(1));
        let pending = timer.callback_snapshot().unwrap();

        machine.service_offered(Duration::from_secs(9));
        pending();

        assert_eq!(machine.state(), ClientServiceState::ServiceReady);
        assert!(timer.is_running());
        assert_eq!(timer.duration(), Some(Duration::from_secs(9)));

        assert!(timer.expire());
        assert_eq!(machine.state(), ClientServiceState::InitialWaitPhase);
    }

    #[test]
    fn test_expiry_racing_drop_is_ignored() {
        let (machine, timer) = machine();
        machine.service_offered(Duration::from_secs(2));

        let shared = Arc::clone(&machine.shared);
        let epoch = shared.lock().epoch;
        drop(machine);

        shared.on_lease_expired(epoch);
        assert_eq!(shared.lock().state, ClientServiceState::ServiceReady);
        assert!(!timer.is_running());
        assert!(!timer.has_callback());
    }

    #[test]
    fn test_release_keeps_offer() {
        let (machine, timer) = machine();
        machine.service_offered(Duration::from_secs(2));
        machine.service_not_requested();

        assert_eq!(machine.state(), ClientServiceState::ServiceSeen);
        assert!(!timer.is_running());
        assert!(!timer.has_callback());
        // Flags return to their defaults on leaving ServiceReady
        assert!(machine.client_requested());
        assert!(!machine.activated());
        assert_eq!(machine.ttl(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_stop_from_every_state() {
        let (machine, timer) = machine();
        machine.service_stopped();
        assert_eq!(machine.state(), ClientServiceState::Stopped);

        machine.start();
        machine.service_offered(Duration::from_secs(2));
        machine.service_stopped();
        assert_eq!(machine.state(), ClientServiceState::Stopped);
        assert!(!timer.is_running());
        assert!(!timer.has_callback());
        assert_eq!(machine.ttl(), None);

        machine.start();
        machine.service_not_requested();
        machine.service_offered(Duration::from_secs(2));
        assert_eq!(machine.state(), ClientServiceState::ServiceSeen);
        machine.service_stopped();
        assert_eq!(machine.state(), ClientServiceState::Stopped);
    }

    #[test]
    fn test_stale_expiry_is_ignored() {
        let (machine, timer) = machine();
        machine.service_offered(Duration::from_secs(2));
        let stale = timer.callback_snapshot().unwrap();

        machine.service_not_requested();
        machine.service_requested();
        assert_eq!(machine.state(), ClientServiceState::ServiceReady);

        stale();
        assert_eq!(machine.state(), ClientServiceState::ServiceReady);
    }

    #[test]
    fn test_drop_unregisters_callback() {
        let timer = ManualLeaseTimer::new();
        let stale = {
            let machine = ServiceAvailabilityMachine::with_timer("test", timer.clone());
            machine.start();
            machine.service_offered(Duration::from_secs(2));
            timer.callback_snapshot().unwrap()
        };

        assert!(!timer.has_callback());
        assert!(!timer.is_running());
        assert!(!timer.expire());
        // A callback captured before the drop finds nothing to act on
        stale();
    }

    #[test]
    fn test_wait_until_ready_times_out() {
        let (machine, _timer) = machine();
        assert!(!machine.wait_until_ready(Duration::from_millis(20)));
    }

    #[test]
    fn test_wait_until_ready_wakes_on_offer() {
        let (machine, _timer) = machine();
        let machine = Arc::new(machine);

        let offer = {
            let machine = Arc::clone(&machine);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                machine.service_offered(Duration::from_secs(10));
            })
        };

        assert!(machine.wait_until_ready(Duration::from_secs(5)));
        offer.join().unwrap();
    }
}
