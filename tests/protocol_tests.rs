//! SCPI Protocol Tests
//!
//! Tests for line assembly, header matching, parameters, status reporting
//! and response formatting.

use heapless::String;
use relay_mux::error::ScpiError;
use relay_mux::protocol::params::{expect_none, parse_register, parse_u32, ChannelList, ChannelListEntry};
use relay_mux::protocol::pattern::{keyword_matches, matches};
use relay_mux::protocol::response::{Reply, ResponseWriter};
use relay_mux::protocol::status::{
    ErrorQueue, StatusRegisters, ESR_CME, ESR_DDE, ESR_EXE, STB_EAV, STB_ESB, STB_MSS,
};
use relay_mux::protocol::{units, ProgramUnit, ScpiParser};
use relay_mux::types::{Channel, ChannelMask};

fn feed_all(parser: &mut ScpiParser, bytes: &[u8]) -> Vec<Result<Vec<u8>, ScpiError>> {
    bytes
        .iter()
        .filter_map(|&b| parser.feed(b))
        .map(|line| line.map(|l| l.to_vec()))
        .collect()
}

// ============================================================================
// Line Parser Tests
// ============================================================================

#[test]
fn test_parser_default() {
    let parser = ScpiParser::default();
    assert_eq!(parser.pending(), 0);
}

#[test]
fn test_parser_line_feed_terminates() {
    let mut parser = ScpiParser::new();
    let lines = feed_all(&mut parser, b"*IDN?\n");
    assert_eq!(lines, vec![Ok(b"*IDN?".to_vec())]);
}

#[test]
fn test_parser_ignores_carriage_return() {
    let mut parser = ScpiParser::new();
    let lines = feed_all(&mut parser, b"*RST\r\nGET?\r\n");
    assert_eq!(lines, vec![Ok(b"*RST".to_vec()), Ok(b"GET?".to_vec())]);
}

#[test]
fn test_parser_holds_partial_line() {
    let mut parser = ScpiParser::new();
    assert!(feed_all(&mut parser, b"ROUT:CL").is_empty());
    assert_eq!(parser.pending(), 7);
    let lines = feed_all(&mut parser, b"OS (@1)\n");
    assert_eq!(lines, vec![Ok(b"ROUT:CLOS (@1)".to_vec())]);
}

#[test]
fn test_parser_clear() {
    let mut parser = ScpiParser::new();
    feed_all(&mut parser, b"JUNK");
    parser.clear();
    assert_eq!(feed_all(&mut parser, b"*CLS\n"), vec![Ok(b"*CLS".to_vec())]);
}

#[test]
fn test_parser_full_length_line() {
    let mut parser = ScpiParser::new();
    let mut input = vec![b'A'; 128];
    input.push(b'\n');
    let lines = feed_all(&mut parser, &input);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].as_ref().map(Vec::len), Ok(128));
}

#[test]
fn test_parser_overrun_reports_and_recovers() {
    let mut parser = ScpiParser::new();
    let mut input = vec![b'A'; 200];
    input.extend_from_slice(b"\n*OPC?\n");

    let lines = feed_all(&mut parser, &input);

    assert_eq!(
        lines,
        vec![Err(ScpiError::InputBufferOverrun), Ok(b"*OPC?".to_vec())]
    );
}

// ============================================================================
// Program Unit Tests
// ============================================================================

#[test]
fn test_units_split_on_semicolon() {
    let parts: Vec<&str> = units("CLOS (@1);OPEN (@2);;GET?").collect();
    assert_eq!(parts, vec!["CLOS (@1)", "OPEN (@2)", "", "GET?"]);
}

#[test]
fn test_units_respect_quotes() {
    let parts: Vec<&str> = units("X \"a;b\";Y 'c;d'").collect();
    assert_eq!(parts, vec!["X \"a;b\"", "Y 'c;d'"]);
}

#[test]
fn test_program_unit_header_and_params() {
    let unit = ProgramUnit::parse("  ROUT:CLOS   (@1,3) ").unwrap().unwrap();
    assert_eq!(unit.header, "ROUT:CLOS");
    assert_eq!(unit.params, "(@1,3)");
}

#[test]
fn test_program_unit_no_params() {
    let unit = ProgramUnit::parse("*RST").unwrap().unwrap();
    assert_eq!(unit.header, "*RST");
    assert_eq!(unit.params, "");
}

#[test]
fn test_program_unit_empty() {
    assert_eq!(ProgramUnit::parse("   "), Ok(None));
}

#[test]
fn test_program_unit_bad_header() {
    assert_eq!(ProgramUnit::parse("ROUT-CLOS (@1)"), Err(ScpiError::SyntaxError));
}

// ============================================================================
// Header Pattern Tests
// ============================================================================

#[test]
fn test_keyword_short_and_long() {
    assert!(keyword_matches("CLOSe", "CLOS"));
    assert!(keyword_matches("CLOSe", "close"));
    assert!(!keyword_matches("CLOSe", "CLO"));
    assert!(!keyword_matches("CLOSe", "CLOSED"));
    assert!(keyword_matches("OPEN", "open"));
}

#[test]
fn test_pattern_optional_root() {
    assert!(matches("[ROUTe]:CLOSe?", "CLOS?"));
    assert!(matches("[ROUTe]:CLOSe?", "rout:close?"));
    assert!(matches("[ROUTe]:CLOSe?", ":ROUTE:CLOS?"));
    assert!(!matches("[ROUTe]:CLOSe?", "CLOS"));
    assert!(!matches("[ROUTe]:CLOSe?", "CLOS:STAT?"));
}

#[test]
fn test_pattern_optional_leaf() {
    assert!(matches("[ROUTe]:SET[:BBM]", "SET"));
    assert!(matches("[ROUTe]:SET[:BBM]", "ROUT:SET:BBM"));
    assert!(!matches("[ROUTe]:SET[:BBM]", "SET:MBB"));
    assert!(matches("SYSTem:ERRor[:NEXT]?", "SYST:ERR?"));
    assert!(matches("SYSTem:ERRor[:NEXT]?", "SYSTEM:ERROR:NEXT?"));
    assert!(!matches("SYSTem:ERRor[:NEXT]?", "SYS:ERR?"));
}

#[test]
fn test_pattern_common_commands() {
    assert!(matches("*IDN?", "*idn?"));
    assert!(!matches("*IDN?", "*IDN"));
    assert!(!matches("*RST", "*RST?"));
}

#[test]
fn test_pattern_rejects_empty_node() {
    assert!(!matches("[ROUTe]:CLOSe", "ROUT::CLOS"));
    assert!(!matches("[ROUTe]:CLOSe", ""));
}

// ============================================================================
// Channel List Tests
// ============================================================================

#[test]
fn test_channel_list_singles() {
    let list = ChannelList::parse("(@1,3)").unwrap();
    assert_eq!(list.mask(), ChannelMask::from_bits(0b101));
    assert_eq!(list.entries().len(), 2);
}

#[test]
fn test_channel_list_range() {
    let list = ChannelList::parse("(@2:4)").unwrap();
    assert_eq!(list.mask(), ChannelMask::from_bits(0b1110));
    assert_eq!(
        list.entries(),
        &[ChannelListEntry::Range(
            Channel::new(2).unwrap(),
            Channel::new(4).unwrap()
        )]
    );
}

#[test]
fn test_channel_list_keeps_request_order() {
    let list = ChannelList::parse("(@3,1,4:6)").unwrap();
    let order: Vec<u8> = list.channels().map(Channel::number).collect();
    assert_eq!(order, vec![3, 1, 4, 5, 6]);
}

#[test]
fn test_channel_list_reversed_range_is_empty() {
    let list = ChannelList::parse("(@2,6:4)").unwrap();
    assert_eq!(list.mask(), ChannelMask::from_bits(0b10));
    let order: Vec<u8> = list.channels().map(Channel::number).collect();
    assert_eq!(order, vec![2]);

    // Both ends are still range-checked
    assert_eq!(ChannelList::parse("(@9:2)"), Err(ScpiError::DataOutOfRange));
}

#[test]
fn test_channel_list_whitespace() {
    let list = ChannelList::parse("( @ 1 , 3 : 4 )").unwrap();
    assert_eq!(list.mask(), ChannelMask::from_bits(0b1101));
}

#[test]
fn test_channel_list_empty() {
    let list = ChannelList::parse("(@)").unwrap();
    assert!(list.is_empty());
    assert_eq!(list.mask(), ChannelMask::NONE);
}

#[test]
fn test_channel_list_errors() {
    assert_eq!(ChannelList::parse(""), Err(ScpiError::MissingParameter));
    assert_eq!(ChannelList::parse("1,3"), Err(ScpiError::DataTypeError));
    assert_eq!(ChannelList::parse("(@1,3"), Err(ScpiError::SyntaxError));
    assert_eq!(ChannelList::parse("(@1) 2"), Err(ScpiError::ParameterNotAllowed));
    assert_eq!(ChannelList::parse("(@1!2)"), Err(ScpiError::SyntaxError));
    assert_eq!(ChannelList::parse("(@a)"), Err(ScpiError::SyntaxError));
    assert_eq!(ChannelList::parse("(@1,)"), Err(ScpiError::SyntaxError));
}

#[test]
fn test_channel_list_out_of_range() {
    assert_eq!(ChannelList::parse("(@1,99)"), Err(ScpiError::DataOutOfRange));
    assert_eq!(ChannelList::parse("(@0)"), Err(ScpiError::DataOutOfRange));
    assert_eq!(ChannelList::parse("(@-1)"), Err(ScpiError::DataOutOfRange));
    assert_eq!(ChannelList::parse("(@2:9)"), Err(ScpiError::DataOutOfRange));
}

#[test]
fn test_channel_list_too_many_entries() {
    let many = format!("(@{})", vec!["1"; 17].join(","));
    assert_eq!(ChannelList::parse(&many), Err(ScpiError::TooMuchData));

    let enough = format!("(@{})", vec!["1"; 16].join(","));
    assert!(ChannelList::parse(&enough).is_ok());
}

// ============================================================================
// Numeric Parameter Tests
// ============================================================================

#[test]
fn test_parse_u32_decimal() {
    assert_eq!(parse_u32("5"), Ok(5));
    assert_eq!(parse_u32(" +7 "), Ok(7));
    assert_eq!(parse_u32("4294967295"), Ok(u32::MAX));
}

#[test]
fn test_parse_u32_bases() {
    assert_eq!(parse_u32("#H1F"), Ok(0x1F));
    assert_eq!(parse_u32("#hff"), Ok(0xFF));
    assert_eq!(parse_u32("#Q17"), Ok(0o17));
    assert_eq!(parse_u32("#B101"), Ok(0b101));
}

#[test]
fn test_parse_u32_errors() {
    assert_eq!(parse_u32(""), Err(ScpiError::MissingParameter));
    assert_eq!(parse_u32("1,2"), Err(ScpiError::ParameterNotAllowed));
    assert_eq!(parse_u32("-1"), Err(ScpiError::DataOutOfRange));
    assert_eq!(parse_u32("abc"), Err(ScpiError::DataTypeError));
    assert_eq!(parse_u32("#H"), Err(ScpiError::DataTypeError));
    assert_eq!(parse_u32("#B2"), Err(ScpiError::DataTypeError));
    assert_eq!(parse_u32("4294967296"), Err(ScpiError::DataOutOfRange));
}

#[test]
fn test_parse_register() {
    assert_eq!(parse_register("255"), Ok(255));
    assert_eq!(parse_register("256"), Err(ScpiError::DataOutOfRange));
}

#[test]
fn test_expect_none() {
    assert_eq!(expect_none(""), Ok(()));
    assert_eq!(expect_none("   "), Ok(()));
    assert_eq!(expect_none("1"), Err(ScpiError::ParameterNotAllowed));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_codes_and_messages() {
    assert_eq!(ScpiError::SyntaxError.code(), -102);
    assert_eq!(ScpiError::DataTypeError.code(), -104);
    assert_eq!(ScpiError::ParameterNotAllowed.code(), -108);
    assert_eq!(ScpiError::MissingParameter.code(), -109);
    assert_eq!(ScpiError::UndefinedHeader.code(), -113);
    assert_eq!(ScpiError::DataOutOfRange.code(), -222);
    assert_eq!(ScpiError::TooMuchData.code(), -223);
    assert_eq!(ScpiError::QueueOverflow.code(), -350);
    assert_eq!(ScpiError::InputBufferOverrun.code(), -363);
    assert_eq!(ScpiError::UndefinedHeader.message(), "Undefined header");
}

#[test]
fn test_error_display() {
    assert_eq!(
        format!("{}", ScpiError::DataOutOfRange),
        "-222,\"Data out of range\""
    );
}

#[test]
fn test_error_esr_class() {
    assert_eq!(ScpiError::SyntaxError.esr_bit(), ESR_CME);
    assert_eq!(ScpiError::DataOutOfRange.esr_bit(), ESR_EXE);
    assert_eq!(ScpiError::InputBufferOverrun.esr_bit(), ESR_DDE);
}

// ============================================================================
// Status Tests
// ============================================================================

#[test]
fn test_error_queue_fifo() {
    let mut queue = ErrorQueue::new();
    queue.push(ScpiError::SyntaxError);
    queue.push(ScpiError::DataOutOfRange);

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop(), Some(ScpiError::SyntaxError));
    assert_eq!(queue.pop(), Some(ScpiError::DataOutOfRange));
    assert_eq!(queue.pop(), None);
}

#[test]
fn test_error_queue_overflow_replaces_newest() {
    let mut queue = ErrorQueue::new();
    for _ in 0..17 {
        queue.push(ScpiError::DataOutOfRange);
    }
    queue.push(ScpiError::UndefinedHeader);
    queue.push(ScpiError::SyntaxError);

    assert_eq!(queue.len(), 17);
    for _ in 0..16 {
        assert_eq!(queue.pop(), Some(ScpiError::DataOutOfRange));
    }
    assert_eq!(queue.pop(), Some(ScpiError::QueueOverflow));
    assert!(queue.is_empty());
}

#[test]
fn test_error_queue_clear() {
    let mut queue = ErrorQueue::new();
    queue.push(ScpiError::SyntaxError);
    queue.clear();
    assert!(queue.is_empty());
}

#[test]
fn test_status_byte() {
    let mut status = StatusRegisters::new();
    assert_eq!(status.stb(false), 0);
    assert_eq!(status.stb(true), STB_EAV);

    status.esr = ESR_CME;
    assert_eq!(status.stb(false), 0);

    status.ese = ESR_CME;
    assert_eq!(status.stb(false), STB_ESB);

    status.sre = STB_ESB;
    assert_eq!(status.stb(false), STB_ESB | STB_MSS);

    assert_eq!(status.take_esr(), ESR_CME);
    assert_eq!(status.esr, 0);
}

// ============================================================================
// Response Tests
// ============================================================================

#[test]
fn test_reply_display() {
    let mut flags = heapless::Vec::new();
    flags.extend_from_slice(&[0, 1, 1]).unwrap();

    assert_eq!(format!("{}", Reply::Flags(flags)), "0,1,1");
    assert_eq!(format!("{}", Reply::Unsigned(42)), "42");
    assert_eq!(
        format!("{}", Reply::Channels(ChannelMask::from_bits(0b101))),
        "(@1,3)"
    );
    assert_eq!(format!("{}", Reply::ErrorEntry(None)), "0,\"No error\"");
    assert_eq!(
        format!("{}", Reply::ErrorEntry(Some(ScpiError::SyntaxError))),
        "-102,\"Syntax error\""
    );
    assert_eq!(format!("{}", Reply::Done), "");
}

#[test]
fn test_reply_identity() {
    let text = format!("{}", Reply::Identity("0123ABCD"));
    assert_eq!(
        text,
        format!("devEmbedded,RelayMux,0123ABCD,{}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_writer_joins_with_semicolon() {
    let mut out: String<128> = String::new();
    let mut writer = ResponseWriter::new();

    writer.reply(&mut out, &Reply::Unsigned(1));
    writer.reply(&mut out, &Reply::Done);
    writer.reply(&mut out, &Reply::Channels(ChannelMask::from_bits(1)));
    writer.end_line(&mut out);

    assert_eq!(out.as_str(), "1;(@1)\r\n");
}

#[test]
fn test_writer_no_output_no_line() {
    let mut out: String<128> = String::new();
    let mut writer = ResponseWriter::new();
    writer.reply(&mut out, &Reply::Done);
    writer.end_line(&mut out);
    assert!(out.is_empty());
}

#[test]
fn test_writer_error_on_own_line() {
    let mut out: String<128> = String::new();
    let mut writer = ResponseWriter::new();

    writer.reply(&mut out, &Reply::Unsigned(1));
    writer.error(&mut out, ScpiError::DataOutOfRange);
    writer.end_line(&mut out);

    assert_eq!(out.as_str(), "1\r\n-222,\"Data out of range\"\r\n");
}
