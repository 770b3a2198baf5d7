//! End-to-end conversion tests
//!
//! Each test writes real input files into a temp directory, runs the
//! converter and checks the committed CSV output.

use capacity_core::{Address, Amount, SnapshotBuilder};
use cofi_export::{
    cofi::RESCALE_DIVISOR,
    config::{AmountSource, InputConfig, InputFormat, OutputConfig},
    Config, Converter, Error,
};
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

fn config_for(dir: &TempDir, input: &Path, format: InputFormat, amounts: AmountSource) -> Config {
    Config {
        input: InputConfig {
            path: input.to_path_buf(),
            format,
            amounts,
        },
        output: OutputConfig {
            cofi_path: dir.path().join("out.cofi.csv"),
            index_path: Some(dir.path().join("out.index.csv")),
        },
        ..Default::default()
    }
}

fn read_rows(path: &Path) -> Vec<(usize, usize, String)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["debtor", "creditor", "amount"]);
    reader
        .deserialize::<(usize, usize, String)>()
        .map(|row| row.unwrap())
        .collect()
}

fn read_index(path: &Path) -> Vec<(usize, String)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .deserialize::<(usize, String)>()
        .map(|row| row.unwrap())
        .collect()
}

#[test]
fn test_pathfinder2_csv_to_cofi() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("graph.csv");
    std::fs::write(
        &input,
        "0xaa,0xbb,0xaa,0xEE6B280\n\
         0xaa,0xbb,0xbb,0x0\n\
         0xbb,0xcc,0xbb,0x5F5E0FF\n\
         0xcc,0xaa,0xaa,0x2540BE400\n\
         0xcc,0xcc,0xcc,0x2540BE400\n",
    )
    .unwrap();

    let config = config_for(&dir, &input, InputFormat::Pathfinder2Csv, AmountSource::Capacities);
    let report = Converter::new(config.clone()).unwrap().run().unwrap();

    // 0xEE6B280 = 250_000_000, 0x5F5E0FF = 99_999_999, 0x2540BE400 = 10_000_000_000
    assert_eq!(report.accounts, 3);
    assert_eq!(report.input_edges, 4);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.self_loops_skipped, 1);
    assert_eq!(report.dropped_below_unit, 1);

    let rows = read_rows(&config.output.cofi_path);
    assert_eq!(
        rows,
        vec![(0, 1, "2".to_string()), (2, 0, "100".to_string())]
    );

    let index = read_index(config.output.index_path.as_ref().unwrap());
    assert_eq!(
        index,
        vec![
            (0, "0xaa".to_string()),
            (1, "0xbb".to_string()),
            (2, "0xcc".to_string()),
        ]
    );
}

#[test]
fn test_snapshot_to_cofi() {
    let dir = tempfile::tempdir().unwrap();
    let unit = Amount::from(RESCALE_DIVISOR);

    let mut builder = SnapshotBuilder::new();
    let a = builder.address(Address::from_bytes([0x0a; 20]));
    let b = builder.address(Address::from_bytes([0x0b; 20]));
    let org = builder.address(Address::from_bytes([0x0c; 20]));
    builder
        .organization(org)
        .trust(a, b, 100)
        .trust(b, a, 50)
        .balance(a, a, &(&unit * 7u32))
        .balance(b, b, &(&unit * 5u32))
        .balance(b, a, &(&unit * 1u32))
        .balance(a, org, &(&unit * 3u32));

    let input = dir.path().join("snapshot.bin");
    std::fs::write(&input, builder.encode()).unwrap();

    let capacities = config_for(&dir, &input, InputFormat::Snapshot, AmountSource::Capacities);
    Converter::new(capacities.clone()).unwrap().run().unwrap();
    let rows = read_rows(&capacities.output.cofi_path);

    // a -> b at 100%: min(b own 5, a own 7), b holds 1 <= 5
    // a -> org: a's own balance 7
    // b -> a at 50%: max_trusted = 3.5 units, a holds no b tokens, floors to 3
    assert_eq!(
        rows,
        vec![
            (0, 1, "5".to_string()),
            (0, 2, "7".to_string()),
            (1, 0, "3".to_string()),
        ]
    );

    let balances = config_for(&dir, &input, InputFormat::Snapshot, AmountSource::Balances);
    Converter::new(balances.clone()).unwrap().run().unwrap();
    let rows = read_rows(&balances.output.cofi_path);

    // Utilized balances only, self balances skipped
    assert_eq!(
        rows,
        vec![(0, 2, "3".to_string()), (1, 0, "1".to_string())]
    );
}

#[test]
fn test_rows_use_dense_indices() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("graph.csv");
    let mut lines = String::new();
    for i in 0..20u64 {
        let from = format!("0x{:02x}", i);
        let to = format!("0x{:02x}", (i * 7 + 3) % 20);
        let capacity = (i + 1) * RESCALE_DIVISOR;
        lines.push_str(&format!("{},{},{},{:x}\n", from, to, from, capacity));
    }
    // 0x0fff sorts between 0x0f and 0x10 and only has an edge below one unit
    lines.push_str(&format!("0x0fff,0x00,0x0fff,{:x}\n", RESCALE_DIVISOR - 1));
    std::fs::write(&input, lines).unwrap();

    let config = config_for(&dir, &input, InputFormat::Pathfinder2Csv, AmountSource::Capacities);
    let report = Converter::new(config.clone()).unwrap().run().unwrap();
    assert_eq!(report.accounts, 21);
    assert_eq!(report.dropped_below_unit, 1);
    assert_eq!(report.rows_written, 20);

    let index = read_index(config.output.index_path.as_ref().unwrap());
    let positions: Vec<usize> = index.iter().map(|(idx, _)| *idx).collect();
    assert_eq!(positions, (0..report.accounts).collect::<Vec<_>>());
    let dropped = index
        .iter()
        .find(|(_, address)| address == "0x0fff")
        .map(|(idx, _)| *idx)
        .unwrap();
    assert_eq!(dropped, 16);

    let rows = read_rows(&config.output.cofi_path);
    let used: BTreeSet<usize> = rows.iter().flat_map(|(d, c, _)| [*d, *c]).collect();
    let expected: BTreeSet<usize> = (0..report.accounts).filter(|idx| *idx != dropped).collect();
    assert_eq!(used, expected);
    assert!(rows.iter().all(|(d, c, amount)| d != c && amount != "0"));
}

#[test]
fn test_malformed_snapshot_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("snapshot.bin");
    std::fs::write(&input, [0u8, 0, 0, 2, 1, 2, 3]).unwrap();

    let config = config_for(&dir, &input, InputFormat::Snapshot, AmountSource::Balances);
    let result = Converter::new(config.clone()).unwrap().run();

    assert!(matches!(
        result,
        Err(Error::Core(capacity_core::Error::Format(_)))
    ));
    assert!(!config.output.cofi_path.exists());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.csv");

    let config = config_for(&dir, &input, InputFormat::Pathfinder2Csv, AmountSource::Capacities);
    let result = Converter::new(config).unwrap().run();

    assert!(matches!(result, Err(Error::Io(_))));
}
