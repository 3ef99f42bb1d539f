//! Shared helpers for yolol_vm integration tests

#![allow(dead_code)]

use std::time::Duration;

use yolol_vm::include::MemoryFileSystem;
use yolol_vm::{Conversion, ConvertErrors, ConvertOptions, Converter, Value, Vm};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Options that keep variable names readable in assertions
pub fn readable() -> ConvertOptions {
    ConvertOptions::default().with_shorten_variable_names(false)
}

pub fn convert_with(options: ConvertOptions, source: &str) -> Result<Conversion, ConvertErrors> {
    let fs = MemoryFileSystem::new();
    Converter::new(&fs)
        .with_options(options)
        .convert_source(source, None)
}

/// Convert and print, panicking with every error on failure
pub fn yolol(options: ConvertOptions, source: &str) -> String {
    match convert_with(options, source) {
        Ok(conversion) => conversion.source().unwrap(),
        Err(errors) => panic!("conversion failed:\n{}", errors),
    }
}

/// Run `vm` until the variable `flag` becomes 1, then return it terminated
pub fn run_until_flag(vm: &Vm, flag: &str, max_lines: u64) {
    let flag = flag.to_string();
    vm.set_variable_changed_handler(move |vm, name, value| {
        if name == flag && *value == Value::from(1_i64) {
            vm.terminate();
        }
    });
    vm.set_max_executed_lines(max_lines);
    vm.resume();
    assert!(
        vm.wait_for_termination_timeout(TIMEOUT),
        "vm did not terminate: {:?}",
        vm
    );
}
