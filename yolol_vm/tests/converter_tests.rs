//! NOLOL programs converted and then executed

mod common;

use common::{convert_with, readable, run_until_flag, yolol};
use pretty_assertions::assert_eq;
use yolol_vm::config::{MAX_LINES, MAX_LINE_LENGTH};
use yolol_vm::include::MemoryFileSystem;
use yolol_vm::optimizers::{apply, StaticExpressionOptimizer};
use yolol_vm::{ConvertError, ConvertOptions, Converter, Value, Vm};
use yolol_vm_parser::{parse_yolol, Printer};

const FIZZBUZZ: &str = r#"
// fizzbuzz for 1 to 100
define limit = 100
out = ""
number = 1
while number <= limit do
    if number % 15 == 0 then
        out += "fizzbuzz "
    else if number % 3 == 0 then
        out += "fizz "
    else if number % 5 == 0 then
        out += "buzz "
    else
        out += number + " "
    end
next> number++
end
:done = 1
"#;

#[test]
fn test_simple_program_runs() {
    let conversion = convert_with(ConvertOptions::default(), "a = 1 + 2\nb = a == 3").unwrap();
    let vm = Vm::new(conversion.program.clone());
    vm.set_max_executed_lines(1);
    vm.resume();
    vm.wait_for_termination();
    assert_eq!(
        vm.get_variable(conversion.translate("b")),
        Some(Value::from(1_i64))
    );
}

#[test]
fn test_fizzbuzz_fits_and_runs() {
    let conversion = convert_with(ConvertOptions::default(), FIZZBUZZ).unwrap();
    let source = conversion.source().unwrap();
    assert!(source.lines().count() <= MAX_LINES, "{}", source);
    assert!(source.lines().all(|line| line.len() <= MAX_LINE_LENGTH), "{}", source);
    assert!(!source.contains("//"));

    let expected: String = (1..=100)
        .map(|n| match (n % 3, n % 5) {
            (0, 0) => "fizzbuzz ".to_string(),
            (0, _) => "fizz ".to_string(),
            (_, 0) => "buzz ".to_string(),
            _ => format!("{} ", n),
        })
        .collect();
    let vm = Vm::new(conversion.program.clone());
    run_until_flag(&vm, ":done", 100_000);
    assert_eq!(
        vm.get_variable(conversion.translate("out")),
        Some(Value::from(expected.as_str()))
    );
}

#[test]
fn test_conversion_is_deterministic() {
    let first = yolol(ConvertOptions::default(), FIZZBUZZ);
    let second = yolol(ConvertOptions::default(), FIZZBUZZ);
    assert_eq!(first, second);
}

#[test]
fn test_break_and_continue_run_correctly() {
    let source = "\
i = 0
sum = 0
while 1 do
    i++
    if i % 2 == 0 then
        continue
    end
    if i > 9 then
        break
    end
    sum += i
end
:done = 1";
    let conversion = convert_with(readable(), source).unwrap();
    let vm = Vm::new(conversion.program.clone());
    run_until_flag(&vm, ":done", 10_000);
    assert_eq!(vm.get_variable("sum"), Some(Value::from(25_i64)));
    assert_eq!(vm.get_variable("i"), Some(Value::from(11_i64)));
}

#[test]
fn test_macro_insertions_do_not_share_locals() {
    let source = "\
macro swap(x, y)
tmp = x
x = y
y = tmp
end
a = 1
b = 2
insert swap(a, b)
insert swap(a, b)
:done = 1";
    let conversion = convert_with(readable(), source).unwrap();
    let text = conversion.source().unwrap();
    assert!(text.contains("_macro_swap_1_tmp"), "{}", text);
    assert!(text.contains("_macro_swap_2_tmp"), "{}", text);

    let vm = Vm::new(conversion.program.clone());
    run_until_flag(&vm, ":done", 1_000);
    assert_eq!(vm.get_variable("a"), Some(Value::from(1_i64)));
    assert_eq!(vm.get_variable("b"), Some(Value::from(2_i64)));
}

#[test]
fn test_definitions_and_builtins() {
    let source = "\
define scale = 10
define square(v) = v * v
a = square(3) + scale
b = abs(0 - a)";
    let conversion = convert_with(readable(), source).unwrap();
    let text = conversion.source().unwrap();
    assert!(text.starts_with("a=19 "), "{}", text);
    assert!(!text.contains("scale"), "{}", text);

    let vm = Vm::new(conversion.program.clone());
    vm.set_max_executed_lines(1);
    vm.resume();
    vm.wait_for_termination();
    assert_eq!(vm.get_variable("b"), Some(Value::from(19_i64)));
}

#[test]
fn test_folding_is_idempotent() {
    let output = yolol(ConvertOptions::default(), "a = 2 * 3 + 4\nb = \"x\" + 1\nc = d * 1");
    let mut program = parse_yolol(&output).unwrap();
    apply(&mut program, &mut StaticExpressionOptimizer::new());
    assert_eq!(Printer::new().print(&program).unwrap(), output);
}

#[test]
fn test_globals_keep_their_names() {
    let output = yolol(ConvertOptions::default(), "counter = 0\n:Counter = counter + 1");
    assert!(output.contains(":Counter"), "{}", output);
    assert!(!output.contains("counter="), "{}", output);
}

#[test]
fn test_labels_are_case_insensitive() {
    let output = yolol(readable(), "a = 0\nTop> a++\n$ goto TOP");
    assert_eq!(output, "a=0\na++\ngoto 2\n");
}

#[test]
fn test_all_errors_of_a_pass_are_reported() {
    let errors = convert_with(readable(), "goto one\ngoto two").unwrap_err();
    let labels: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ConvertError::UnknownLabel { label, .. } => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, ["one", "two"]);
}

#[test]
fn test_parse_errors_name_the_file() {
    let fs = MemoryFileSystem::new();
    let errors = Converter::new(&fs)
        .convert_source("a = (1", Some("broken.nolol"))
        .unwrap_err();
    assert!(matches!(
        errors.first(),
        Some(ConvertError::Parse { file, .. }) if file == "broken.nolol"
    ));
}

#[test]
fn test_program_too_long() {
    let source: Vec<String> = (0..40)
        .map(|i| format!("$ variable_{} = {} $", i, i))
        .collect();
    let errors = convert_with(readable(), &source.join("\n")).unwrap_err();
    assert!(matches!(
        errors.first(),
        Some(ConvertError::ProgramTooLong { max: 20, .. })
    ));
}

#[test]
fn test_continue_in_goto_chain_if_drops_the_jump_to_its_end() {
    let source = "\
i = 0
sum = 0
while i < 6 do
    i++
    if i % 2 == 0 then
        $ sum += i
        continue
    else
        sum += 100
    end
end
:done = 1";
    let conversion = convert_with(readable(), source).unwrap();
    // `goto _if_end` right after the `continue` jump is gone
    assert_eq!(
        conversion.source().unwrap(),
        "\
i=0 sum=0
if i>=6 then goto 5 end i++ if i%2!=0 then goto 4 end
sum+=i goto 2
sum+=100 goto 2
:done=1 goto 1
"
    );

    let vm = Vm::new(conversion.program.clone());
    run_until_flag(&vm, ":done", 1_000);
    assert_eq!(vm.get_variable("sum"), Some(Value::from(312_i64)));
    assert_eq!(vm.get_variable("i"), Some(Value::from(6_i64)));
}

#[test]
fn test_while_body_ending_in_goto_drops_the_jump_back() {
    let source = "\
n = 0
again> n++
while n % 3 != 0 do
    $ total += n
    goto again
end
:done = 1";
    let conversion = convert_with(readable(), source).unwrap();
    assert_eq!(
        conversion.source().unwrap(),
        "\
n=0
n++
if n%3==0 then goto 5 end
total+=n goto 2
:done=1 goto 1
"
    );

    let vm = Vm::new(conversion.program.clone());
    run_until_flag(&vm, ":done", 1_000);
    assert_eq!(vm.get_variable("total"), Some(Value::from(3_i64)));
    assert_eq!(vm.get_variable("n"), Some(Value::from(3_i64)));
}
