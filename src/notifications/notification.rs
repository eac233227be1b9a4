use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{BlockTreeEntry, SynchronizationState, Warning};

use super::contain;

/// The chain's tip was updated to the provided block entry.
pub trait BlockTipCallback: Send + Sync {
    fn on_block_tip(
        &self,
        state: SynchronizationState,
        entry: &BlockTreeEntry,
        verification_progress: f64,
    );
}

impl<F> BlockTipCallback for F
where
    F: Fn(SynchronizationState, &BlockTreeEntry, f64) + Send + Sync,
{
    fn on_block_tip(
        &self,
        state: SynchronizationState,
        entry: &BlockTreeEntry,
        verification_progress: f64,
    ) {
        self(state, entry, verification_progress)
    }
}

/// A new best block header was added.
pub trait HeaderTipCallback: Send + Sync {
    fn on_header_tip(&self, state: SynchronizationState, height: i64, timestamp: i64, presync: bool);
}

impl<F> HeaderTipCallback for F
where
    F: Fn(SynchronizationState, i64, i64, bool) + Send + Sync,
{
    fn on_header_tip(
        &self,
        state: SynchronizationState,
        height: i64,
        timestamp: i64,
        presync: bool,
    ) {
        self(state, height, timestamp, presync)
    }
}

/// Reports on the progress of a long-running operation.
///
/// May fire many times for one logical operation; each report replaces the
/// previous one.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, title: &str, progress_percent: i32, resume_possible: bool);
}

impl<F> ProgressCallback for F
where
    F: Fn(&str, i32, bool) + Send + Sync,
{
    fn on_progress(&self, title: &str, progress_percent: i32, resume_possible: bool) {
        self(title, progress_percent, resume_possible)
    }
}

/// A warning state was raised by the engine during validation.
pub trait WarningSetCallback: Send + Sync {
    fn on_warning_set(&self, warning: Warning, message: &str);
}

impl<F> WarningSetCallback for F
where
    F: Fn(Warning, &str) + Send + Sync,
{
    fn on_warning_set(&self, warning: Warning, message: &str) {
        self(warning, message)
    }
}

/// A previous condition leading to the issuance of a warning is no longer
/// given.
pub trait WarningUnsetCallback: Send + Sync {
    fn on_warning_unset(&self, warning: Warning);
}

impl<F> WarningUnsetCallback for F
where
    F: Fn(Warning) + Send + Sync,
{
    fn on_warning_unset(&self, warning: Warning) {
        self(warning)
    }
}

/// An error was encountered when flushing data to disk. Non-fatal.
pub trait FlushErrorCallback: Send + Sync {
    fn on_flush_error(&self, message: &str);
}

impl<F> FlushErrorCallback for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_flush_error(&self, message: &str) {
        self(message)
    }
}

/// An unrecoverable error was encountered by the engine.
///
/// After this fires, the engine's state is potentially corrupt and no
/// further engine calls are answered; see
/// [`crate::DispatchError::Fatal`].
pub trait FatalErrorCallback: Send + Sync {
    fn on_fatal_error(&self, message: &str);
}

impl<F> FatalErrorCallback for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_fatal_error(&self, message: &str) {
        self(message)
    }
}

/// Registry for managing notification callback handlers.
///
/// Handlers are registered once, before the context is built; slots left
/// unbound are skipped when the corresponding event fires.
#[derive(Default)]
pub struct NotificationCallbackRegistry {
    pub(crate) block_tip: Option<Box<dyn BlockTipCallback>>,
    pub(crate) header_tip: Option<Box<dyn HeaderTipCallback>>,
    pub(crate) progress: Option<Box<dyn ProgressCallback>>,
    pub(crate) warning_set: Option<Box<dyn WarningSetCallback>>,
    pub(crate) warning_unset: Option<Box<dyn WarningUnsetCallback>>,
    pub(crate) flush_error: Option<Box<dyn FlushErrorCallback>>,
    pub(crate) fatal_error: Option<Box<dyn FatalErrorCallback>>,
}

impl NotificationCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_block_tip<T>(&mut self, handler: T) -> &mut Self
    where
        T: BlockTipCallback + 'static,
    {
        self.block_tip = Some(Box::new(handler));
        self
    }

    pub fn register_header_tip<T>(&mut self, handler: T) -> &mut Self
    where
        T: HeaderTipCallback + 'static,
    {
        self.header_tip = Some(Box::new(handler));
        self
    }

    pub fn register_progress<T>(&mut self, handler: T) -> &mut Self
    where
        T: ProgressCallback + 'static,
    {
        self.progress = Some(Box::new(handler));
        self
    }

    pub fn register_warning_set<T>(&mut self, handler: T) -> &mut Self
    where
        T: WarningSetCallback + 'static,
    {
        self.warning_set = Some(Box::new(handler));
        self
    }

    pub fn register_warning_unset<T>(&mut self, handler: T) -> &mut Self
    where
        T: WarningUnsetCallback + 'static,
    {
        self.warning_unset = Some(Box::new(handler));
        self
    }

    pub fn register_flush_error<T>(&mut self, handler: T) -> &mut Self
    where
        T: FlushErrorCallback + 'static,
    {
        self.flush_error = Some(Box::new(handler));
        self
    }

    pub fn register_fatal_error<T>(&mut self, handler: T) -> &mut Self
    where
        T: FatalErrorCallback + 'static,
    {
        self.fatal_error = Some(Box::new(handler));
        self
    }
}

/// Routes notification events to the registered handler set.
///
/// Handler panics are contained and never propagate back into the engine.
/// `fatal_error` latches the dispatcher; the latch is inspected by the
/// chainstate manager after every engine interaction.
pub(crate) struct NotificationDispatcher {
    registry: NotificationCallbackRegistry,
    halted: AtomicBool,
    fatal_message: Mutex<Option<String>>,
}

impl NotificationDispatcher {
    pub(crate) fn new(registry: NotificationCallbackRegistry) -> Self {
        NotificationDispatcher {
            registry,
            halted: AtomicBool::new(false),
            fatal_message: Mutex::new(None),
        }
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    pub(crate) fn fatal_message(&self) -> Option<String> {
        self.fatal_message.lock().unwrap().clone()
    }

    pub(crate) fn block_tip(
        &self,
        state: SynchronizationState,
        entry: &BlockTreeEntry,
        verification_progress: f64,
    ) {
        if let Some(handler) = &self.registry.block_tip {
            contain("block_tip", || {
                handler.on_block_tip(state, entry, verification_progress)
            });
        }
    }

    pub(crate) fn header_tip(
        &self,
        state: SynchronizationState,
        height: i64,
        timestamp: i64,
        presync: bool,
    ) {
        if let Some(handler) = &self.registry.header_tip {
            contain("header_tip", || {
                handler.on_header_tip(state, height, timestamp, presync)
            });
        }
    }

    pub(crate) fn progress(&self, title: &str, progress_percent: i32, resume_possible: bool) {
        if let Some(handler) = &self.registry.progress {
            contain("progress", || {
                handler.on_progress(title, progress_percent, resume_possible)
            });
        }
    }

    pub(crate) fn warning_set(&self, warning: Warning, message: &str) {
        if let Some(handler) = &self.registry.warning_set {
            contain("warning_set", || handler.on_warning_set(warning, message));
        }
    }

    pub(crate) fn warning_unset(&self, warning: Warning) {
        if let Some(handler) = &self.registry.warning_unset {
            contain("warning_unset", || handler.on_warning_unset(warning));
        }
    }

    pub(crate) fn flush_error(&self, message: &str) {
        if let Some(handler) = &self.registry.flush_error {
            contain("flush_error", || handler.on_flush_error(message));
        }
    }

    pub(crate) fn fatal_error(&self, message: &str) {
        if let Some(handler) = &self.registry.fatal_error {
            contain("fatal_error", || handler.on_fatal_error(message));
        }
        *self.fatal_message.lock().unwrap() = Some(message.to_string());
        self.halted.store(true, Ordering::SeqCst);
        log::error!("engine raised a fatal error: {}", message);
    }
}

/// Handle through which an engine emits notification events.
///
/// The handle is cheap to clone and may be moved to engine-internal threads;
/// events emitted from such threads reach the handlers on the emitting
/// thread. Handlers that touch shared state must bring their own
/// synchronization.
#[derive(Clone)]
pub struct Notifications {
    dispatcher: Arc<NotificationDispatcher>,
}

impl Notifications {
    pub(crate) fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Notifications { dispatcher }
    }

    /// The best validated block changed. The progress estimate is not
    /// guaranteed monotonic under reorganizations.
    pub fn block_tip(
        &self,
        state: SynchronizationState,
        entry: &BlockTreeEntry,
        verification_progress: f64,
    ) {
        self.dispatcher.block_tip(state, entry, verification_progress);
    }

    /// The best known header advanced. `presync` distinguishes header-only
    /// prefetch from full synchronization.
    pub fn header_tip(
        &self,
        state: SynchronizationState,
        height: i64,
        timestamp: i64,
        presync: bool,
    ) {
        self.dispatcher.header_tip(state, height, timestamp, presync);
    }

    /// A long-running operation made progress.
    pub fn progress(&self, title: &str, progress_percent: i32, resume_possible: bool) {
        self.dispatcher.progress(title, progress_percent, resume_possible);
    }

    /// A warning condition was raised.
    pub fn warning_set(&self, warning: Warning, message: &str) {
        self.dispatcher.warning_set(warning, message);
    }

    /// A previously raised warning condition was cleared.
    pub fn warning_unset(&self, warning: Warning) {
        self.dispatcher.warning_unset(warning);
    }

    /// A non-fatal persistence failure occurred.
    pub fn flush_error(&self, message: &str) {
        self.dispatcher.flush_error(message);
    }

    /// An unrecoverable failure occurred. Latches the context: every later
    /// engine-facing call fails with [`crate::DispatchError::Fatal`].
    pub fn fatal_error(&self, message: &str) {
        self.dispatcher.fatal_error(message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::BlockHash;

    fn dispatcher(registry: NotificationCallbackRegistry) -> NotificationDispatcher {
        NotificationDispatcher::new(registry)
    }

    #[test]
    fn test_unbound_slots_are_skipped() {
        let dispatcher = dispatcher(NotificationCallbackRegistry::new());
        let entry = BlockTreeEntry::new(0, BlockHash { hash: [0u8; 32] });
        dispatcher.block_tip(SynchronizationState::PostInit, &entry, 0.5);
        dispatcher.header_tip(SynchronizationState::InitDownload, 10, 100, true);
        dispatcher.progress("reindex", 10, true);
        dispatcher.warning_set(Warning::LargeWorkInvalidChain, "warned");
        dispatcher.warning_unset(Warning::LargeWorkInvalidChain);
        dispatcher.flush_error("flush");
        assert!(!dispatcher.is_halted());
    }

    #[test]
    fn test_bound_slot_receives_payload() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = NotificationCallbackRegistry::new();
        let sink = seen.clone();
        registry.register_header_tip(
            move |state: SynchronizationState, height: i64, timestamp: i64, presync: bool| {
                sink.lock()
                    .unwrap()
                    .push((state, height, timestamp, presync));
            },
        );
        let dispatcher = dispatcher(registry);
        dispatcher.header_tip(SynchronizationState::PostInit, 7, 1714234522, false);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(SynchronizationState::PostInit, 7, 1714234522, false)]
        );
    }

    #[test]
    fn test_warning_set_unset_are_independent_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotificationCallbackRegistry::new();
        let set_count = count.clone();
        registry.register_warning_set(move |_: Warning, _: &str| {
            set_count.fetch_add(1, Ordering::SeqCst);
        });
        let unset_count = count.clone();
        registry.register_warning_unset(move |_: Warning| {
            unset_count.fetch_add(10, Ordering::SeqCst);
        });
        let dispatcher = dispatcher(registry);
        dispatcher.warning_set(Warning::UnknownNewRulesActivated, "a");
        dispatcher.warning_unset(Warning::UnknownNewRulesActivated);
        dispatcher.warning_set(Warning::UnknownNewRulesActivated, "b");
        assert_eq!(count.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_handler_panic_is_contained() {
        let mut registry = NotificationCallbackRegistry::new();
        registry.register_flush_error(|_: &str| panic!("handler bug"));
        let dispatcher = dispatcher(registry);
        dispatcher.flush_error("disk full");
        // the dispatcher survives and later events still go through
        dispatcher.flush_error("disk full again");
        assert!(!dispatcher.is_halted());
    }

    #[test]
    fn test_fatal_error_latches() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut registry = NotificationCallbackRegistry::new();
        let sink = fired.clone();
        registry.register_fatal_error(move |_: &str| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        let dispatcher = dispatcher(registry);
        assert!(!dispatcher.is_halted());
        dispatcher.fatal_error("state corrupt");
        assert!(dispatcher.is_halted());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.fatal_message().as_deref(), Some("state corrupt"));
    }

    #[test]
    fn test_fatal_error_latches_without_handler() {
        let dispatcher = dispatcher(NotificationCallbackRegistry::new());
        dispatcher.fatal_error("state corrupt");
        assert!(dispatcher.is_halted());
    }
}
