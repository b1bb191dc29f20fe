/// Test modules for the forecasting package
///
/// * `cnnlstm` - End-to-end tests that train the CNN-LSTM model on synthetic series
///   and check predictions, degenerate scaling and the persisted bundle.
///
/// Unit tests for each pipeline step live next to the code in `src/cnnlstm/`.
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod cnnlstm;

static BACKEND_RNG: Mutex<()> = Mutex::new(());

/// Serializes tests that draw from the ndarray backend's process-global RNG.
///
/// `Backend::seed` and every weight initialization share that RNG, so a seeded
/// run is only reproducible while no other test initializes tensors.
pub fn backend_rng_guard() -> MutexGuard<'static, ()> {
    BACKEND_RNG.lock().unwrap_or_else(PoisonError::into_inner)
}
