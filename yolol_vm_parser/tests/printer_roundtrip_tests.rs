//! Parse -> print -> parse must give back the same tree

mod common;

use common::strip_spans;
use pretty_assertions::assert_eq;
use yolol_vm_parser::{parse_yolol, Printer};

fn assert_round_trip(source: &str) {
    let first = parse_yolol(source).unwrap();
    let printed = Printer::new().print(&first).unwrap();
    let second = parse_yolol(&printed)
        .unwrap_or_else(|e| panic!("reprinted source failed to parse: {}\n{}", printed, e));
    assert_eq!(strip_spans(first), strip_spans(second), "printed: {}", printed);
}

#[test]
fn test_round_trip_arithmetic() {
    assert_round_trip("a = 1 + 2 * 3 - 4 / 5 % 6 ^ 7");
    assert_round_trip("a = (1 + 2) * (3 - (4 - 5))");
    assert_round_trip("a = -b ^ 2   c = (-2) ^ 2   d = - -3");
    assert_round_trip("a = abs b + sqrt (c * 2) + sin d ^ 2");
}

#[test]
fn test_round_trip_logic() {
    assert_round_trip("a = not b == c and d or e != f");
    assert_round_trip("a = not (b and c)   d = (e or f) and g");
    assert_round_trip("a = (b < c) == (d >= e)");
}

#[test]
fn test_round_trip_increments() {
    assert_round_trip("a = b++ + ++c - d-- - --e   f++   --g");
    assert_round_trip("a = b! + (c!)!   d = (abs e)!");
}

#[test]
fn test_round_trip_statements() {
    assert_round_trip("if a then b = 1 c = 2 else goto 3 end // tail");
    assert_round_trip("if a then if b then c = 1 end end\n\ngoto a + 1");
    assert_round_trip(":out = \"fizz\" + :in   s -= \"z\"");
}

#[test]
fn test_print_is_compact() {
    let program = parse_yolol("if   :a  ==  1   then   b  =  \"x\"   end").unwrap();
    assert_eq!(
        Printer::new().print(&program).unwrap(),
        "if :a==1 then b=\"x\" end\n"
    );
}
