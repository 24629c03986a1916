//! Read-session behavior against a scripted card
//!
//! `ScriptedCard` answers each command APDU from a table; anything not in
//! the table gets `6A82` (file not found). Every command sent is recorded so
//! tests can check exactly what the reader asked for.

use std::cell::RefCell;
use std::collections::HashMap;

use transit_card::apdu::{commands, ApduCommand, ApduResponse, Transport};
use transit_card::protocol::{aids, ApplicationProfile, TransitCard};
use transit_card::{Amount, ReaderConfig, SessionStage, TransactionKind};

#[derive(Clone)]
enum Reply {
    Data(Vec<u8>, [u8; 2]),
    Fault(pcsc::Error),
}

#[derive(Default)]
struct ScriptedCard {
    replies: HashMap<Vec<u8>, Reply>,
    sent: RefCell<Vec<Vec<u8>>>,
}

impl ScriptedCard {
    fn new() -> Self {
        Self::default()
    }

    fn ok(mut self, command: ApduCommand, data: Vec<u8>) -> Self {
        self.replies.insert(command.build(), Reply::Data(data, [0x90, 0x00]));
        self
    }

    fn status(mut self, command: ApduCommand, sw: [u8; 2]) -> Self {
        self.replies.insert(command.build(), Reply::Data(Vec::new(), sw));
        self
    }

    fn fault(mut self, command: ApduCommand, error: pcsc::Error) -> Self {
        self.replies.insert(command.build(), Reply::Fault(error));
        self
    }

    fn with_ledger(mut self, sfi: u8, slots: Vec<Vec<u8>>) -> Self {
        for (i, slot) in slots.into_iter().enumerate() {
            self = self.ok(commands::read_record(i as u8 + 1, sfi), slot);
        }
        self
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().clone()
    }

    fn was_sent(&self, command: ApduCommand) -> bool {
        self.sent.borrow().contains(&command.build())
    }

    fn count_p2(&self, ins: u8, p2: u8) -> usize {
        self.sent
            .borrow()
            .iter()
            .filter(|apdu| apdu[1] == ins && apdu[3] == p2)
            .count()
    }
}

impl Transport for ScriptedCard {
    fn send_apdu(&self, apdu: &[u8]) -> Result<ApduResponse, pcsc::Error> {
        self.sent.borrow_mut().push(apdu.to_vec());
        match self.replies.get(apdu) {
            Some(Reply::Data(data, sw)) => Ok(ApduResponse {
                data: data.clone(),
                sw1: sw[0],
                sw2: sw[1],
            }),
            Some(Reply::Fault(error)) => Err(*error),
            None => Ok(ApduResponse {
                data: Vec::new(),
                sw1: 0x6A,
                sw2: 0x82,
            }),
        }
    }
}

/// A 23-byte ledger slot
fn slot(cents: u32, code: u8, bcd_datetime: &str) -> Vec<u8> {
    let mut data = vec![0x00, 0x01, 0x00, 0x00, 0x00];
    data.extend_from_slice(&cents.to_be_bytes());
    data.push(code);
    data.extend_from_slice(&[0x00, 0x00, 0x12, 0x34, 0x56, 0x78]);
    data.extend_from_slice(&hex::decode(bcd_datetime).unwrap());
    data
}

fn identity(card_number: &str, issue: &str, expiry: &str) -> Vec<u8> {
    hex::decode(format!("{}{}{}{}", "00".repeat(10), card_number, issue, expiry)).unwrap()
}

fn p2_for(sfi: u8) -> u8 {
    (sfi << 3) | 0x04
}

fn mohurd() -> ApplicationProfile {
    transit_card::PROFILES[0]
}

fn t_union() -> ApplicationProfile {
    transit_card::PROFILES[1]
}

#[test]
fn test_select_falls_back_to_second_profile() {
    let card = ScriptedCard::new()
        .status(commands::select(aids::MOHURD), [0x6A, 0x82])
        .ok(commands::select(aids::T_UNION), vec![0x6F, 0x00]);

    let mut transit = TransitCard::new(&card);
    let profile = transit.select_application().unwrap();

    assert_eq!(profile, t_union());
    assert_eq!(transit.active_profile(), Some(t_union()));
    assert_eq!(
        card.sent(),
        vec![commands::select(aids::MOHURD).build(), commands::select(aids::T_UNION).build()]
    );
}

#[test]
fn test_select_stops_at_first_success() {
    let card = ScriptedCard::new()
        .ok(commands::select(aids::MOHURD), Vec::new())
        .ok(commands::select(aids::T_UNION), Vec::new());

    let mut transit = TransitCard::new(&card);
    assert_eq!(transit.select_application().unwrap(), mohurd());
    assert!(!card.was_sent(commands::select(aids::T_UNION)));
}

#[test]
fn test_select_transport_fault_tries_next_profile() {
    let card = ScriptedCard::new()
        .fault(commands::select(aids::MOHURD), pcsc::Error::Timeout)
        .ok(commands::select(aids::T_UNION), Vec::new());

    let mut transit = TransitCard::new(&card);
    assert_eq!(transit.select_application().unwrap(), t_union());
}

#[test]
fn test_select_exhausted() {
    let card = ScriptedCard::new();
    let mut transit = TransitCard::new(&card);

    assert!(matches!(
        transit.select_application(),
        Err(transit_card::ReadError::NoApplication)
    ));
    assert_eq!(transit.active_profile(), None);
}

#[test]
fn test_balance() {
    let card = ScriptedCard::new().ok(commands::query_balance(), vec![0x00, 0x00, 0x27, 0x10]);
    let transit = TransitCard::new(&card);

    let balance = transit.read_balance().unwrap();
    assert_eq!(balance, Amount::from_cents(10_000));
    assert_eq!(balance.to_string(), "100.00");
}

#[test]
fn test_balance_failures() {
    let short = ScriptedCard::new().ok(commands::query_balance(), vec![0x00, 0x27, 0x10]);
    assert!(matches!(
        TransitCard::new(&short).read_balance(),
        Err(transit_card::ReadError::ShortResponse { actual: 3, .. })
    ));

    let rejected = ScriptedCard::new().status(commands::query_balance(), [0x69, 0x85]);
    let err = TransitCard::new(&rejected).read_balance().unwrap_err();
    assert_eq!(err.to_string(), "GET BALANCE rejected by card: SW=6985");

    let fault = ScriptedCard::new().fault(commands::query_balance(), pcsc::Error::RemovedCard);
    assert!(matches!(
        TransitCard::new(&fault).read_balance(),
        Err(transit_card::ReadError::Transport(pcsc::Error::RemovedCard))
    ));
}

#[test]
fn test_ledger_stops_at_zero_slot_and_first_location() {
    let card = ScriptedCard::new()
        .with_ledger(
            21,
            vec![
                slot(200, 0x09, "20240101100000"),
                slot(5000, 0x02, "20240102090000"),
                vec![0x00; 23],
                slot(300, 0x06, "20240103090000"),
            ],
        )
        .with_ledger(18, vec![slot(100, 0x05, "20240105090000")]);

    let scan = TransitCard::new(&card).read_transactions();

    assert_eq!(scan.sfi, Some(21));
    assert_eq!(scan.records.len(), 2);
    assert_eq!(scan.records[0].timestamp, "2024-01-02 09:00:00");
    assert_eq!(scan.records[0].kind, TransactionKind::TopUp);
    assert_eq!(scan.records[1].timestamp, "2024-01-01 10:00:00");

    // SFI 24 tried once, SFI 21 up to the zero slot, nothing after
    assert_eq!(card.count_p2(0xB2, p2_for(24)), 1);
    assert_eq!(card.count_p2(0xB2, p2_for(21)), 3);
    assert!(!card.was_sent(commands::read_record(4, 21)));
    assert_eq!(card.count_p2(0xB2, p2_for(18)), 0);
}

#[test]
fn test_ledger_skips_short_records_without_stopping() {
    let card = ScriptedCard::new().with_ledger(
        24,
        vec![
            slot(100, 0x09, "20240101100000"),
            vec![0x01; 10],
            slot(200, 0x09, "20240101110000"),
        ],
    );

    let scan = TransitCard::new(&card).read_transactions();
    assert_eq!(scan.sfi, Some(24));
    assert_eq!(scan.records.len(), 2);
    assert!(card.was_sent(commands::read_record(4, 24)));
}

#[test]
fn test_ledger_records_keep_spaced_raw_hex() {
    let data = slot(100, 0x09, "20240101100000");
    let card = ScriptedCard::new().with_ledger(24, vec![data.clone()]);

    let scan = TransitCard::new(&card).read_transactions();
    let expected = data.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ");
    assert_eq!(scan.records[0].raw, expected);
    assert!(scan.records[0].raw.starts_with("00 01 00 00 00 00 00 00 64 09"));
}

#[test]
fn test_ledger_location_with_only_short_records_is_skipped() {
    let card = ScriptedCard::new()
        .with_ledger(24, vec![vec![0x01; 10]])
        .with_ledger(21, vec![slot(100, 0x09, "20240101100000")]);

    let scan = TransitCard::new(&card).read_transactions();
    assert_eq!(scan.sfi, Some(21));
    assert_eq!(scan.records.len(), 1);
}

#[test]
fn test_ledger_transport_fault_ends_location() {
    let card = ScriptedCard::new()
        .fault(commands::read_record(1, 24), pcsc::Error::Timeout)
        .ok(commands::read_record(2, 24), slot(100, 0x09, "20240101100000"))
        .with_ledger(3, vec![slot(100, 0x06, "20240101100000")]);

    let scan = TransitCard::new(&card).read_transactions();
    assert_eq!(scan.sfi, Some(3));
    assert!(!card.was_sent(commands::read_record(2, 24)));
}

#[test]
fn test_ledger_empty_response_ends_location() {
    let card = ScriptedCard::new()
        .ok(commands::read_record(1, 24), Vec::new())
        .ok(commands::read_record(2, 24), slot(100, 0x09, "20240101100000"));

    let scan = TransitCard::new(&card).read_transactions();
    assert_eq!(scan.sfi, None);
    assert!(scan.records.is_empty());
    assert!(!card.was_sent(commands::read_record(2, 24)));
    // every candidate probed once
    assert_eq!(card.sent().len(), 6);
}

#[test]
fn test_ledger_respects_record_limit() {
    let slots = (0..20)
        .map(|i| slot(i, 0x09, &format!("202401{:02}100000", i + 1)))
        .collect();
    let card = ScriptedCard::new().with_ledger(24, slots);

    let scan = TransitCard::new(&card).read_transactions();
    assert_eq!(scan.records.len(), 10);
    assert!(!card.was_sent(commands::read_record(11, 24)));

    let card = ScriptedCard::new().with_ledger(
        24,
        (0..20).map(|i| slot(i, 0x09, "20240101100000")).collect(),
    );
    let config = ReaderConfig::default().with_max_records(50);
    let scan = TransitCard::with_config(&card, config).read_transactions();
    assert_eq!(scan.records.len(), 20);
    assert!(!card.was_sent(commands::read_record(21, 24)));
}

#[test]
fn test_identity() {
    let card = ScriptedCard::new().ok(
        commands::read_identity(),
        identity("31040000000012345678", "20230115", "20330115"),
    );

    let record = TransitCard::new(&card).read_identity().unwrap();
    assert_eq!(record.card_number, "31040000000012345678");
    assert_eq!(record.issue_date, "2023/01/15");
    assert_eq!(record.expiry_date, "2033/01/15");
}

#[test]
fn test_identity_failures() {
    let empty = ScriptedCard::new().ok(commands::read_identity(), Vec::new());
    assert!(matches!(
        TransitCard::new(&empty).read_identity(),
        Err(transit_card::ReadError::EmptyResponse { .. })
    ));

    let bad_date = ScriptedCard::new().ok(
        commands::read_identity(),
        identity("31040000000012345678", "20231399", "20330115"),
    );
    assert!(matches!(
        TransitCard::new(&bad_date).read_identity(),
        Err(transit_card::ReadError::Identity(_))
    ));

    let rejected = ScriptedCard::new();
    assert!(matches!(
        TransitCard::new(&rejected).read_identity(),
        Err(transit_card::ReadError::Status { .. })
    ));
}

#[test]
fn test_read_card_info_full() {
    let card = ScriptedCard::new()
        .ok(commands::select(aids::MOHURD), Vec::new())
        .ok(commands::query_balance(), vec![0x00, 0x00, 0x27, 0x10])
        .with_ledger(
            18,
            vec![
                slot(200, 0x09, "20240101100000"),
                slot(300, 0x06, "20240102090000"),
            ],
        )
        .ok(
            commands::read_identity(),
            identity("31040000000012345678", "20230115", "20330115"),
        );

    let result = TransitCard::new(&card).read_card_info();

    assert!(result.success);
    assert_eq!(result.stage, SessionStage::Done);
    assert_eq!(result.profile, Some(mohurd()));
    assert_eq!(result.balance, Some(Amount::from_cents(10_000)));
    assert_eq!(result.ledger_sfi, Some(18));
    assert_eq!(result.transactions.len(), 2);
    assert_eq!(result.transactions[0].kind, TransactionKind::Bus);
    assert_eq!(result.identity.as_ref().unwrap().expiry_date, "2033/01/15");
    assert_eq!(
        result.logs,
        vec![
            "Card recognised (MOHURD (primary))",
            "Balance: 100.00",
            "Read 2 transaction records (SFI 18)",
            "Card number: 31040000000012345678",
            "Issued: 2023/01/15",
            "Valid until: 2033/01/15",
        ]
    );
}

#[test]
fn test_read_card_info_partial() {
    let card = ScriptedCard::new()
        .ok(commands::select(aids::MOHURD), Vec::new())
        .fault(commands::query_balance(), pcsc::Error::Timeout);

    let result = TransitCard::new(&card).read_card_info();

    assert!(result.success);
    assert_eq!(result.stage, SessionStage::Done);
    assert_eq!(result.balance, None);
    assert!(result.transactions.is_empty());
    assert_eq!(result.identity, None);
    assert!(result.logs[1].starts_with("Balance read failed"));
    assert_eq!(result.logs[2], "No transaction records found");
    assert!(result.logs[3].starts_with("Card number read failed"));
    // later stages still ran
    assert!(card.was_sent(commands::read_record(1, 2)));
    assert!(card.was_sent(commands::read_identity()));
}

#[test]
fn test_read_card_info_unrecognised_card() {
    let card = ScriptedCard::new()
        .status(commands::select(aids::MOHURD), [0x6A, 0x82])
        .status(commands::select(aids::T_UNION), [0x6A, 0x82])
        .ok(commands::query_balance(), vec![0x00, 0x00, 0x27, 0x10]);

    let result = TransitCard::new(&card).read_card_info();

    assert!(!result.success);
    assert_eq!(result.stage, SessionStage::SelectionFailed);
    assert_eq!(result.profile, None);
    assert_eq!(result.balance, None);
    assert!(result.transactions.is_empty());
    assert_eq!(result.identity, None);
    assert_eq!(card.sent().len(), 2);
}
