use anyhow::Result;

use granule_bloom::{Granule, IndexConfig, IndexConfigBuilder, IndexError};

// Single test in this binary: it mutates process env.
#[test]
fn env_and_builder_overrides() -> Result<()> {
    std::env::set_var("GBF_BITS_PER_ROW", "12");
    std::env::set_var("GBF_HASH_FUNCTIONS", " 5 ");
    let cfg = IndexConfig::from_env();
    assert_eq!(cfg, IndexConfig::new(12, 5));

    // Builder starts from env, explicit setters win.
    let cfg = IndexConfigBuilder::new().hash_functions(2).build()?;
    assert_eq!(cfg, IndexConfig::new(12, 2));

    // Garbage is ignored, defaults stay.
    std::env::set_var("GBF_BITS_PER_ROW", "lots");
    assert_eq!(IndexConfig::from_env().bits_per_row, 8);

    // Too many hash functions for the seed table is caught before any granule exists.
    std::env::set_var("GBF_HASH_FUNCTIONS", "40");
    let err = IndexConfigBuilder::new().build().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<IndexError>(),
        Some(IndexError::TooManyHashFunctions { requested: 40, available: 15 })
    ));
    let err = Granule::new_empty(&IndexConfig::from_env(), 1).unwrap_err();
    assert!(err.downcast_ref::<IndexError>().is_some());

    std::env::remove_var("GBF_BITS_PER_ROW");
    std::env::remove_var("GBF_HASH_FUNCTIONS");
    Ok(())
}
