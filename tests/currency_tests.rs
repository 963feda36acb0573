use installment_core::currency::{format_currency_display, parse_currency_input, Money};

#[test]
fn display_and_parse_round_trip() {
    for cents in [0, 5, 99, 100, 1_999, 123_456, 100_000_000] {
        let value = Money::from_cents(cents);
        let shown = format_currency_display(value);
        assert_eq!(parse_currency_input(&shown), value, "via {shown}");
    }
}

#[test]
fn accepts_bare_and_symbol_prefixed_input() {
    assert_eq!(parse_currency_input("1.234,56"), Money::from_cents(123_456));
    assert_eq!(parse_currency_input("R$ 39,90"), Money::from_cents(3_990));
    assert_eq!(parse_currency_input("100"), Money::from_cents(10_000));
    assert_eq!(parse_currency_input(",5"), Money::from_cents(50));
}

#[test]
fn extra_fraction_digits_round_half_up() {
    assert_eq!(parse_currency_input("1,005"), Money::from_cents(101));
    assert_eq!(parse_currency_input("1,004"), Money::from_cents(100));
}

#[test]
fn garbage_input_never_errors() {
    for text in ["", "abc", "12,3,4", "1a2", "R$", "3,x5"] {
        assert_eq!(parse_currency_input(text), Money::ZERO, "input {text:?}");
    }
}

#[test]
fn overlong_numbers_parse_to_zero_instead_of_failing() {
    assert_eq!(parse_currency_input("922337203685477581"), Money::ZERO);
    assert_eq!(
        parse_currency_input("999999999999999999,99"),
        Money::ZERO
    );
}

#[test]
fn negative_amounts_format_with_leading_sign() {
    assert_eq!(format_currency_display(Money::from_cents(-123_456)), "-R$ 1.234,56");
    assert_eq!(Money::from_cents(-250).abs(), Money::from_cents(250));
}

#[test]
fn major_minor_constructor_matches_parsed_input() {
    assert_eq!(Money::from_major_minor(39, 90), parse_currency_input("39,90"));
    assert_eq!(Money::from_major_minor(-2, 50), Money::from_cents(-250));
}
