use std::collections::HashSet;
use std::io::Cursor;

use anyhow::Result;
use oorandom::Rand64;

use granule_bloom::hash::BF_HASH_SEEDS;
use granule_bloom::{BloomFilter, Granule, IndexConfig, IndexError};

fn random_sets(rng: &mut Rand64, columns: usize, max_card: u64) -> Vec<HashSet<u64>> {
    (0..columns)
        .map(|_| {
            let n = 1 + rng.rand_u64() % max_card;
            (0..n).map(|_| rng.rand_u64()).collect()
        })
        .collect()
}

/// Random configs × random column sets: serialize -> deserialize gives back the same
/// granule, sizes follow the shared formula, and no inserted hash is lost.
#[test]
fn randomized_roundtrip_and_soundness() -> Result<()> {
    let mut rng = Rand64::new(0x5EED_B10F);
    for round in 0..64 {
        let bits_per_row = 1 + rng.rand_u64() % 16;
        let hash_functions = 1 + (rng.rand_u64() % BF_HASH_SEEDS.len() as u64) as usize;
        let columns = 1 + (rng.rand_u64() % 4) as usize;
        let cfg = IndexConfig::new(bits_per_row, hash_functions);

        let sets = random_sets(&mut rng, columns, 200);
        let g = Granule::from_column_hashes(&cfg, &sets)?;

        let max_card = sets.iter().map(|s| s.len()).max().unwrap_or(0) as u64;
        assert_eq!(g.total_rows(), max_card, "round {round}");
        let expected_size = ((bits_per_row * max_card + 7) / 8) as usize;
        assert_eq!(g.filters().len(), columns);
        for f in g.filters() {
            assert_eq!(f.size(), expected_size, "round {round}");
        }

        for (c, set) in sets.iter().enumerate() {
            for &h in set {
                assert!(g.may_contain(c, h)?, "false negative: round {round} column {c}");
            }
        }

        let mut buf = Vec::new();
        g.serialize_binary(&mut buf)?;
        assert_eq!(buf.len(), g.serialized_len());

        let mut back = Granule::new_empty(&cfg, columns)?;
        back.deserialize_binary(&mut Cursor::new(&buf), 1)?;
        assert_eq!(back.total_rows(), g.total_rows());
        for (a, b) in back.filters().iter().zip(g.filters()) {
            assert_eq!(a.as_bytes(), b.as_bytes(), "round {round}");
        }
    }
    Ok(())
}

#[test]
fn cross_column_sizing_uses_largest_column() -> Result<()> {
    let cfg = IndexConfig::new(8, 3);
    let sets: Vec<HashSet<u64>> = vec![
        (1..=3).collect(),
        (100..110).collect(),
        [7u64].into_iter().collect(),
    ];
    let g = Granule::from_column_hashes(&cfg, &sets)?;
    assert_eq!(g.total_rows(), 10);
    // ceil(8 * 10 / 8) = 10 for all three, not 3 / 10 / 1
    let sizes: Vec<usize> = g.filters().iter().map(|f| f.size()).collect();
    assert_eq!(sizes, vec![10, 10, 10]);
    Ok(())
}

#[test]
fn two_values_two_hashes_layout() -> Result<()> {
    let cfg = IndexConfig::new(8, 2);
    let set: HashSet<u64> = [42u64, 100].into_iter().collect();
    let g = Granule::from_column_hashes(&cfg, &[set])?;

    let mut expected = BloomFilter::new(2, 2, 0);
    for h in [42u64, 100] {
        expected.add_hash_with_seed(h, BF_HASH_SEEDS[0]);
        expected.add_hash_with_seed(h, BF_HASH_SEEDS[1]);
    }

    let mut buf = Vec::new();
    g.serialize_binary(&mut buf)?;
    let mut want = vec![0x02u8];
    want.extend_from_slice(expected.as_bytes());
    assert_eq!(buf, want);
    Ok(())
}

#[test]
fn several_granules_back_to_back_in_one_stream() -> Result<()> {
    let cfg = IndexConfig::new(6, 4);
    let mut rng = Rand64::new(42);
    let granules: Vec<Granule> = (0..5)
        .map(|_| Granule::from_column_hashes(&cfg, &random_sets(&mut rng, 2, 50)))
        .collect::<Result<_>>()?;

    let mut buf = Vec::new();
    for g in &granules {
        g.serialize_binary(&mut buf)?;
    }

    let mut cur = Cursor::new(buf);
    for g in &granules {
        let mut back = Granule::new_empty(&cfg, 2)?;
        back.deserialize_binary(&mut cur, 1)?;
        assert_eq!(&back, g);
    }
    assert_eq!(cur.position() as usize, cur.get_ref().len());
    Ok(())
}

#[test]
fn state_gates() -> Result<()> {
    let cfg = IndexConfig::new(8, 2);

    let empty = Granule::new_empty(&cfg, 1)?;
    let err = empty.serialize_binary(&mut Vec::<u8>::new()).unwrap_err();
    assert_eq!(err.downcast_ref::<IndexError>(), Some(&IndexError::EmptyGranule));

    let none: [HashSet<u64>; 0] = [];
    let err = Granule::from_column_hashes(&cfg, &none).unwrap_err();
    assert_eq!(err.downcast_ref::<IndexError>(), Some(&IndexError::EmptyColumns));

    let set: HashSet<u64> = [1u64].into_iter().collect();
    let mut full = Granule::from_column_hashes(&cfg, &[set])?;
    let err = full
        .deserialize_binary(&mut Cursor::new(vec![1u8, 0xFF]), 1)
        .unwrap_err();
    assert_eq!(err.downcast_ref::<IndexError>(), Some(&IndexError::AlreadyPopulated));

    let mut target = Granule::new_empty(&cfg, 1)?;
    for version in [0u32, 2, 255] {
        let mut cur = Cursor::new(vec![1u8, 0xFF]);
        let err = target.deserialize_binary(&mut cur, version).unwrap_err();
        assert_eq!(err.downcast_ref::<IndexError>(), Some(&IndexError::UnknownVersion(version)));
        assert_eq!(cur.position(), 0);
    }
    assert!(target.is_empty());
    Ok(())
}

/// Populated granules are read-only and can be probed from many threads at once.
#[test]
fn concurrent_readers() -> Result<()> {
    let cfg = IndexConfig::new(10, 4);
    let set: HashSet<u64> = (0..500u64).map(|i| i * 31 + 7).collect();
    let g = Granule::from_column_hashes(&cfg, &[set.clone()])?;

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for &h in &set {
                    assert!(g.may_contain(0, h).unwrap());
                }
            });
        }
    });
    Ok(())
}
