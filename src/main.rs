use env_logger::Builder;
use log::LevelFilter;

use chain_dispatch::{
    Block, BlockTreeEntry, BlockValidationState, ChainType, ChainstateManager,
    ChainstateManagerOptions, ContextBuilder, InMemoryEngine, NotificationCallbackRegistry,
    ProcessBlockResult, SynchronizationState, ValidationCallbackRegistry, ValidationMode, Warning,
};

// Raw regtest block at height 1, wire encoded.
const RAW_BLOCK: &str = "0000002006226e46111a0b59caaf126043eb5bbf28c34f3a5e332a1fc7b2b73c\
                         f188910f295badc0bdd9a2bc0955d12f337491eae4c87ba4660078c015631028\
                         4d47c6ff9a242d66ffff7f200000000001020000000001010000000000000000\
                         000000000000000000000000000000000000000000000000ffffffff025100ff\
                         ffffff0200f2052a010000001600141409745405c4e8310a875bcd602db6b9b3\
                         dc0cf90000000000000000266a24aa21a9ede2f61c3f71d1defd3fa999dfa369\
                         53755c690689799962b48bebd836974e8cf90120000000000000000000000000\
                         000000000000000000000000000000000000000000000000";

fn setup_logging() {
    let mut builder = Builder::from_default_env();
    builder.filter(None, LevelFilter::Info).init();
}

fn notification_handlers() -> NotificationCallbackRegistry {
    let mut registry = NotificationCallbackRegistry::new();
    registry
        .register_block_tip(
            |state: SynchronizationState, entry: &BlockTreeEntry, progress: f64| {
                log::info!(
                    "[BLOCK TIP] State: {:?}, Height: {}, Progress: {:.2}%",
                    state,
                    entry.height(),
                    progress * 100.0
                );
                log::info!("        Block Hash: {}", entry.block_hash());
            },
        )
        .register_header_tip(
            |state: SynchronizationState, height: i64, timestamp: i64, presync: bool| {
                log::info!(
                    "[HEADER TIP] State: {:?}, Height: {}, Timestamp: {}, Presync: {}",
                    state,
                    height,
                    timestamp,
                    presync
                );
            },
        )
        .register_progress(|title: &str, percent: i32, resume_possible: bool| {
            log::info!(
                "[PROGRESS] {}: {}% (Resume possible: {})",
                title,
                percent,
                resume_possible
            );
        })
        .register_warning_set(|warning: Warning, message: &str| {
            log::info!("[WARNING SET] Type: {:?}", warning);
            log::info!("        Message: {}", message);
        })
        .register_warning_unset(|warning: Warning| {
            log::info!("[WARNING UNSET] Type: {:?}", warning);
        })
        .register_flush_error(|message: &str| {
            log::info!("[FLUSH ERROR] {}", message);
        })
        .register_fatal_error(|message: &str| {
            log::info!("[FATAL ERROR] {}", message);
        });
    registry
}

fn validation_handlers() -> ValidationCallbackRegistry {
    let mut registry = ValidationCallbackRegistry::new();
    registry
        .register_block_checked(|block: &Block, state: &BlockValidationState| {
            log::info!("[BLOCK CHECKED] Validation: {:?}", state.validation_mode());
            log::info!("        Block Hash: {}", block.hash());
            if state.validation_mode() == ValidationMode::Invalid {
                log::info!(
                    "            Validation Result: {:?}",
                    state.block_validation_result()
                );
            }
        })
        .register_pow_valid_block(|block: &Block, entry: &BlockTreeEntry| {
            log::info!("[POW VALID BLOCK] Height: {}", entry.height());
            log::info!("                Block Hash: {}", block.hash());
        })
        .register_block_connected(|block: &Block, entry: &BlockTreeEntry| {
            log::info!(
                "[BLOCK CONNECTED] Height: {}, Transactions: {}",
                entry.height(),
                block.transaction_count()
            );
            log::info!("                  Block Hash: {}", block.hash());
        })
        .register_block_disconnected(|block: &Block, entry: &BlockTreeEntry| {
            log::info!("[BLOCK DISCONNECTED] Height: {}", entry.height());
            log::info!("                     Block Hash: {}", block.hash());
        });
    registry
}

fn report(result: ProcessBlockResult) {
    match result {
        ProcessBlockResult::NewBlock => log::info!("Valid Block and Block Processed"),
        ProcessBlockResult::Duplicate => log::info!("Valid Duplicate Block"),
        ProcessBlockResult::Rejected => log::info!("Invalid Block"),
    }
}

fn main() {
    setup_logging();

    let context = ContextBuilder::new()
        .chain_type(ChainType::Regtest)
        .notifications(notification_handlers())
        .validation_interface(validation_handlers())
        .build()
        .unwrap();

    let options = ChainstateManagerOptions::new(&context, ".bitcoin", ".bitcoin/blocks").unwrap();
    let chainman = ChainstateManager::new(options, Box::new(InMemoryEngine::new())).unwrap();

    let raw_block = hex::decode(RAW_BLOCK).unwrap();
    let block = Block::try_from(raw_block.as_slice()).unwrap();

    report(chainman.process_block(&block).unwrap());
    report(chainman.process_block(&block).unwrap());

    // same block with its chain linkage corrupted
    let mut corrupted = raw_block.clone();
    corrupted[4] ^= 0xff;
    let corrupted = Block::try_from(corrupted.as_slice()).unwrap();
    report(chainman.process_block(&corrupted).unwrap());
}
