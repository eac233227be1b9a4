use std::sync::Arc;

use crate::engine::codes::{
    CHAIN_TYPE_MAINNET, CHAIN_TYPE_REGTEST, CHAIN_TYPE_SIGNET, CHAIN_TYPE_TESTNET,
    CHAIN_TYPE_TESTNET_4,
};
use crate::notifications::notification::NotificationDispatcher;
use crate::notifications::validation::ValidationDispatcher;
use crate::{
    BlockHash, DispatchError, NotificationCallbackRegistry, Notifications,
    ValidationCallbackRegistry,
};

/// Network chain types.
///
/// Specifies which network the engine operates on. Each chain type has its
/// own ruleset and genesis block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainType {
    /// The production network
    Mainnet,
    /// The original test network
    Testnet,
    /// The newer test network
    Testnet4,
    /// Signed test network
    Signet,
    /// Regression test network for local development
    Regtest,
}

impl From<ChainType> for u32 {
    fn from(chain_type: ChainType) -> Self {
        match chain_type {
            ChainType::Mainnet => CHAIN_TYPE_MAINNET,
            ChainType::Testnet => CHAIN_TYPE_TESTNET,
            ChainType::Testnet4 => CHAIN_TYPE_TESTNET_4,
            ChainType::Signet => CHAIN_TYPE_SIGNET,
            ChainType::Regtest => CHAIN_TYPE_REGTEST,
        }
    }
}

impl From<u32> for ChainType {
    fn from(value: u32) -> Self {
        match value {
            CHAIN_TYPE_MAINNET => ChainType::Mainnet,
            CHAIN_TYPE_TESTNET => ChainType::Testnet,
            CHAIN_TYPE_TESTNET_4 => ChainType::Testnet4,
            CHAIN_TYPE_SIGNET => ChainType::Signet,
            CHAIN_TYPE_REGTEST => ChainType::Regtest,
            _ => panic!("Unknown chain type: {}", value),
        }
    }
}

// Genesis block hashes in the engine's native byte order.
const MAINNET_GENESIS: [u8; 32] = [
    0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7,
    0x4f, 0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00,
    0x00, 0x00,
];
const TESTNET_GENESIS: [u8; 32] = [
    0x43, 0x49, 0x7f, 0xd7, 0xf8, 0x26, 0x95, 0x71, 0x08, 0xf4, 0xa3, 0x0f, 0xd9, 0xce, 0xc3,
    0xae, 0xba, 0x79, 0x97, 0x20, 0x84, 0xe9, 0x0e, 0xad, 0x01, 0xea, 0x33, 0x09, 0x00, 0x00,
    0x00, 0x00,
];
const TESTNET_4_GENESIS: [u8; 32] = [
    0x43, 0xf0, 0x8b, 0xda, 0xb0, 0x50, 0xe3, 0x5b, 0x56, 0x7c, 0x86, 0x4b, 0x91, 0xf4, 0x7f,
    0x50, 0xae, 0x72, 0x5a, 0xe2, 0xde, 0x53, 0xbc, 0xfb, 0xba, 0xf2, 0x84, 0xda, 0x00, 0x00,
    0x00, 0x00,
];
const SIGNET_GENESIS: [u8; 32] = [
    0xf6, 0x1e, 0xee, 0x3b, 0x63, 0xa3, 0x80, 0xa4, 0x77, 0xa0, 0x63, 0xaf, 0x32, 0xb2, 0xbb,
    0xc9, 0x7c, 0x9f, 0xf9, 0xf0, 0x1f, 0x2c, 0x42, 0x25, 0xe9, 0x73, 0x98, 0x81, 0x08, 0x00,
    0x00, 0x00,
];
const REGTEST_GENESIS: [u8; 32] = [
    0x06, 0x22, 0x6e, 0x46, 0x11, 0x1a, 0x0b, 0x59, 0xca, 0xaf, 0x12, 0x60, 0x43, 0xeb, 0x5b,
    0xbf, 0x28, 0xc3, 0x4f, 0x3a, 0x5e, 0x33, 0x2a, 0x1f, 0xc7, 0xb2, 0xb7, 0x3c, 0xf1, 0x88,
    0x91, 0x0f,
];

/// The chain parameters with which to configure a [`Context`].
///
/// The context copies what it needs; the caller may drop its value right
/// after attaching it to a builder.
#[derive(Debug, Clone)]
pub struct ChainParams {
    chain_type: ChainType,
    genesis: BlockHash,
}

impl ChainParams {
    pub fn new(chain_type: ChainType) -> ChainParams {
        let genesis = match chain_type {
            ChainType::Mainnet => MAINNET_GENESIS,
            ChainType::Testnet => TESTNET_GENESIS,
            ChainType::Testnet4 => TESTNET_4_GENESIS,
            ChainType::Signet => SIGNET_GENESIS,
            ChainType::Regtest => REGTEST_GENESIS,
        };
        ChainParams {
            chain_type,
            genesis: BlockHash { hash: genesis },
        }
    }

    pub fn chain_type(&self) -> ChainType {
        self.chain_type
    }

    /// Returns an owned copy of the genesis block hash for this chain.
    pub fn genesis_block_hash(&self) -> BlockHash {
        self.genesis.clone()
    }
}

struct ContextInner {
    chain: ChainParams,
    notifications: Arc<NotificationDispatcher>,
    validation: Arc<ValidationDispatcher>,
}

/// The main context struct. This should be set up through the
/// [`ContextBuilder`] and has to be kept in memory for the duration of
/// context-dependent library operations.
///
/// The context owns both registered handler sets. It is a shared handle:
/// clones refer to the same context, and teardown happens when the last
/// handle (including the one held by a [`crate::ChainstateManager`]) is
/// dropped. Each handler's own drop logic runs exactly once at that point.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn chain_params(&self) -> &ChainParams {
        &self.inner.chain
    }

    /// True once the engine reported a fatal error. No further engine calls
    /// are answered past this point.
    pub fn is_halted(&self) -> bool {
        self.inner.notifications.is_halted()
    }

    pub(crate) fn notifications(&self) -> Notifications {
        Notifications::new(self.inner.notifications.clone())
    }

    pub(crate) fn validation(&self) -> &ValidationDispatcher {
        &self.inner.validation
    }

    pub(crate) fn fatal_message(&self) -> Option<String> {
        self.inner.notifications.fatal_message()
    }
}

/// Builder struct for the [`Context`].
///
/// The builder by default configures for mainnet and swallows all
/// notifications. It is consumed by [`ContextBuilder::build`]; handler sets
/// cannot be changed once the context exists.
pub struct ContextBuilder {
    chain: ChainParams,
    notifications: NotificationCallbackRegistry,
    validation: ValidationCallbackRegistry,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> ContextBuilder {
        ContextBuilder {
            chain: ChainParams::new(ChainType::Mainnet),
            notifications: NotificationCallbackRegistry::new(),
            validation: ValidationCallbackRegistry::new(),
        }
    }

    /// Consumes the builder and creates a [`Context`].
    pub fn build(self) -> Result<Context, DispatchError> {
        Ok(Context {
            inner: Arc::new(ContextInner {
                chain: self.chain,
                notifications: Arc::new(NotificationDispatcher::new(self.notifications)),
                validation: Arc::new(ValidationDispatcher::new(self.validation)),
            }),
        })
    }

    /// Sets the chain type.
    pub fn chain_type(mut self, chain_type: ChainType) -> ContextBuilder {
        self.chain = ChainParams::new(chain_type);
        self
    }

    /// Copies the passed chain parameters into the builder.
    pub fn chain_params(mut self, params: &ChainParams) -> ContextBuilder {
        self.chain = params.clone();
        self
    }

    /// Sets the notification callbacks to the passed in registry.
    pub fn notifications(mut self, registry: NotificationCallbackRegistry) -> ContextBuilder {
        self.notifications = registry;
        self
    }

    /// Sets the validation interface callbacks.
    pub fn validation_interface(mut self, registry: ValidationCallbackRegistry) -> ContextBuilder {
        self.validation = registry;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::Warning;

    #[test]
    fn test_default_builder_builds() {
        let context = ContextBuilder::new().build().unwrap();
        assert_eq!(context.chain_params().chain_type(), ChainType::Mainnet);
        assert!(!context.is_halted());
    }

    #[test]
    fn test_chain_params_are_copied_in() {
        let params = ChainParams::new(ChainType::Regtest);
        let builder = ContextBuilder::new().chain_params(&params);
        drop(params);
        let context = builder.build().unwrap();
        assert_eq!(context.chain_params().chain_type(), ChainType::Regtest);
        assert_eq!(
            context.chain_params().genesis_block_hash().to_string(),
            "06226e46111a0b59caaf126043eb5bbf28c34f3a5e332a1fc7b2b73cf188910f"
        );
    }

    #[test]
    fn test_chain_type_round_trip() {
        let chains = [
            ChainType::Mainnet,
            ChainType::Testnet,
            ChainType::Testnet4,
            ChainType::Signet,
            ChainType::Regtest,
        ];
        for chain in chains {
            let raw: u32 = chain.into();
            assert_eq!(ChainType::from(raw), chain);
        }
    }

    #[test]
    #[should_panic(expected = "Unknown chain type")]
    fn test_chain_type_from_invalid_value() {
        let _invalid = ChainType::from(99);
    }

    #[test]
    fn test_each_chain_type_has_a_genesis() {
        let chains = [
            ChainType::Mainnet,
            ChainType::Testnet,
            ChainType::Testnet4,
            ChainType::Signet,
            ChainType::Regtest,
        ];
        let mut seen = Vec::new();
        for chain in chains {
            let genesis = ChainParams::new(chain).genesis_block_hash();
            assert!(!seen.contains(&genesis));
            seen.push(genesis);
        }
    }

    /// Increments a counter when the capturing handler is dropped.
    struct DropSentinel(Arc<AtomicUsize>);

    impl Drop for DropSentinel {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_handler_state_dropped_exactly_once_at_teardown() {
        let drops = Arc::new(AtomicUsize::new(0));
        let sentinel = DropSentinel(drops.clone());
        let mut registry = NotificationCallbackRegistry::new();
        registry.register_warning_set(move |_warning: Warning, _message: &str| {
            let _keep_alive = &sentinel;
        });
        let context = ContextBuilder::new().notifications(registry).build().unwrap();

        // events do not consume the handler state
        context
            .notifications()
            .warning_set(Warning::LargeWorkInvalidChain, "a");
        context
            .notifications()
            .warning_set(Warning::LargeWorkInvalidChain, "b");
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        let second_handle = context.clone();
        drop(context);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(second_handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
