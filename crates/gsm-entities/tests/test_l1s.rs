mod common;

use std::time::Duration;

use gsm_config::StackMode;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{BurstType, FrameNumber, GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING, MframeTask, Sap, SignalQuality, cbits, chan_nr, debug};
use gsm_entities::l1s::{ClockState, L1Command, L1Event, L1Sync};
use gsm_entities::lapdm::{DlState, Lapdm};
use gsm_saps::control::LapdmControl;
use gsm_saps::dl::{DlDataReq, DlEstablishReq, DlReleaseInd, ReleaseCause};
use gsm_saps::mph::MphClockLostInd;
use gsm_saps::ph::PhDataInd;
use gsm_saps::{SapMsg, SapMsgInner};

use common::{ComponentTest, RecordedBurst, RecordingPhy, default_test_config};

fn block(first: &[u8]) -> Vec<u8> {
    let mut block = first.to_vec();
    block.resize(GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING);
    block
}

fn run_frames(l1s: &mut L1Sync, frames: std::ops::RangeInclusive<u32>) {
    for f in frames {
        l1s.frame_tick(FrameNumber::new(f));
    }
}

#[test]
fn test_sdcch_uplink_at_table_position() {
    debug::setup_logging_verbose();
    let config = gsm_config::SharedConfig::from_config(default_test_config(StackMode::Ms));
    let phy = RecordingPhy::new();
    let (mut l1s, link) = L1Sync::new(&config, Box::new(phy.clone()));

    let sdcch = chan_nr(cbits::SDCCH8, 2);
    link.tasks.set_timeslot(2);
    link.tasks.enable(MframeTask::Sdcch8_0);
    let payload = block(&[0x01, 0x3f, 0x01]);
    link.cmd_tx.send(L1Command::DataReq { chan_nr: sdcch, link_id: 0, payload: payload.clone() }).unwrap();

    run_frames(&mut l1s, 0..=70);

    // SDCCH/8 subchannel 0 sends at frame 15 of the 51-multiframe, its SACCH at frame 47 of the 102-multiframe
    let bursts = phy.take_bursts();
    let expected = vec![
        RecordedBurst { tn: 2, fnr: FrameNumber::new(15), burst_type: BurstType::Nb, payload },
        RecordedBurst { tn: 2, fnr: FrameNumber::new(47), burst_type: BurstType::Nb, payload: block(&[0x00, 0x00, 0x01, 0x03, 0x01]) },
        RecordedBurst { tn: 2, fnr: FrameNumber::new(66), burst_type: BurstType::Nb, payload: block(&[0x01, 0x03, 0x01]) },
    ];
    assert_eq!(bursts, expected);
}

#[test]
fn test_bcch_block_delivered() {
    debug::setup_logging_verbose();
    let config = gsm_config::SharedConfig::from_config(default_test_config(StackMode::Ms));
    let (mut l1s, link) = L1Sync::new(&config, Box::new(RecordingPhy::new()));
    link.tasks.enable(MframeTask::BcchNorm);

    run_frames(&mut l1s, 0..=5);
    let si = block(&[0x55, 0x06, 0x19]);
    // Not expected on timeslot 1 or in frame 3
    l1s.burst_receive_indication(1, FrameNumber::new(2), BurstType::Nb, &si, SignalQuality::default());
    l1s.burst_receive_indication(0, FrameNumber::new(3), BurstType::Nb, &si, SignalQuality::default());
    l1s.burst_receive_indication(0, FrameNumber::new(2), BurstType::Nb, &si, SignalQuality::default());

    let events: Vec<L1Event> = link.event_rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    let L1Event::PhDataInd(ind) = &events[0] else { panic!("unexpected {:?}", events[0]) };
    assert_eq!(ind.chan_nr, chan_nr(cbits::BCCH, 0));
    assert_eq!(ind.fnr, FrameNumber::new(2));
    assert_eq!(ind.payload, si);

    // Next BCCH block fails decoding
    run_frames(&mut l1s, 6..=56);
    let bad = SignalQuality { crc_fail: true, ..Default::default() };
    l1s.burst_receive_indication(0, FrameNumber::new(53), BurstType::Nb, &si, bad);
    assert!(link.event_rx.try_recv().is_err());
}

#[test]
fn test_rach_sent_ahead_and_confirmed() {
    debug::setup_logging_verbose();
    let config = gsm_config::SharedConfig::from_config(default_test_config(StackMode::Ms));
    let phy = RecordingPhy::new();
    let (mut l1s, link) = L1Sync::new(&config, Box::new(phy.clone()));

    run_frames(&mut l1s, 0..=9);
    link.cmd_tx.send(L1Command::RachReq { ra: 0x23, fnr: None }).unwrap();
    run_frames(&mut l1s, 10..=20);

    let bursts = phy.take_bursts();
    assert_eq!(bursts, vec![RecordedBurst { tn: 0, fnr: FrameNumber::new(12), burst_type: BurstType::Ab, payload: vec![0x23] }]);
    let events: Vec<L1Event> = link.event_rx.try_iter().collect();
    assert!(matches!(events.as_slice(), [L1Event::RachConf { ra: 0x23, fnr }] if *fnr == FrameNumber::new(12)));
}

#[test]
fn test_resync_drops_skipped_rach() {
    debug::setup_logging_verbose();
    let config = gsm_config::SharedConfig::from_config(default_test_config(StackMode::Ms));
    let phy = RecordingPhy::new();
    let (mut l1s, link) = L1Sync::new(&config, Box::new(phy.clone()));

    link.cmd_tx.send(L1Command::RachReq { ra: 0x11, fnr: Some(FrameNumber::new(30)) }).unwrap();
    run_frames(&mut l1s, 0..=1);
    // The PHY jumps beyond the RACH frame
    run_frames(&mut l1s, 60..=100);

    assert!(phy.take_bursts().is_empty());
    let events: Vec<L1Event> = link.event_rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    let L1Event::Resync { from, to, dropped } = events[0] else { panic!("unexpected {:?}", events[0]) };
    assert_eq!((from.get(), to.get(), dropped), (2, 60, 1));
    assert_eq!(l1s.clock().lost_frames(), 1);
}

#[test]
fn test_clock_loss_supervision() {
    debug::setup_logging_verbose();
    let config = default_test_config(StackMode::Ms);
    let period = Duration::from_millis(config.l1.supervision_ms);
    let mut test = ComponentTest::new(config);
    let mut l1s = test.attach_l1(Box::new(RecordingPhy::new()));
    test.populate_entities(vec![], vec![GsmEntity::Rr, GsmEntity::Lapdm]);

    run_frames(&mut l1s, 0..=9);
    test.advance(period);
    test.advance(period);
    assert!(test.dump_sink(GsmEntity::Rr).is_empty());

    // Second period without frames
    test.advance(period);
    let msgs = test.dump_sink(GsmEntity::Rr);
    assert_eq!(msgs.len(), 1);
    let SapMsgInner::MphClockLostInd(MphClockLostInd { last_fn }) = msgs[0].msg else {
        panic!("unexpected {}", msgs[0].msg);
    };
    assert_eq!(last_fn, Some(FrameNumber::new(9)));

    // Reported once only
    test.advance(period);
    assert!(test.dump_sink(GsmEntity::Rr).is_empty());

    // The clock reset reaches the tick context with the next frame
    l1s.frame_tick(FrameNumber::new(500));
    assert_eq!(l1s.clock().state(), ClockState::Wait);
    l1s.frame_tick(FrameNumber::new(501));
    assert_eq!(l1s.clock().current(), Some(FrameNumber::new(501)));
}

#[test]
fn test_flush_keeps_other_data_links() {
    debug::setup_logging_verbose();
    let config = gsm_config::SharedConfig::from_config(default_test_config(StackMode::Ms));
    let phy = RecordingPhy::new();
    let (mut l1s, link) = L1Sync::new(&config, Box::new(phy.clone()));
    let sdcch = chan_nr(cbits::SDCCH8, 0);
    l1s.enable_task(MframeTask::Sdcch8_0);

    let sapi0 = block(&[0x01, 0x00, 0x05, 0x06]);
    let sapi3 = block(&[0x0d, 0x00, 0x05, 0x09]);
    link.cmd_tx.send(L1Command::DataReq { chan_nr: sdcch, link_id: 0, payload: sapi0 }).unwrap();
    link.cmd_tx.send(L1Command::DataReq { chan_nr: sdcch, link_id: 0x03, payload: sapi3.clone() }).unwrap();
    link.cmd_tx.send(L1Command::Flush { chan_nr: sdcch, link_id: Some(0) }).unwrap();
    run_frames(&mut l1s, 0..=20);

    let bursts = phy.take_bursts();
    assert_eq!(bursts.len(), 1);
    assert_eq!((bursts[0].fnr, &bursts[0].payload), (FrameNumber::new(15), &sapi3));

    // A clock reset drops everything still queued
    link.cmd_tx.send(L1Command::DataReq { chan_nr: sdcch, link_id: 0, payload: block(&[0x01, 0x3f, 0x01]) }).unwrap();
    link.cmd_tx.send(L1Command::ClockReset).unwrap();
    run_frames(&mut l1s, 21..=70);
    let bursts = phy.take_bursts();
    let sdcch_bursts: Vec<&RecordedBurst> = bursts.iter().filter(|b| b.fnr == FrameNumber::new(66)).collect();
    assert_eq!(sdcch_bursts.len(), 1);
    assert_eq!(sdcch_bursts[0].payload, block(&[0x01, 0x03, 0x01]));
}

#[test]
fn test_released_link_sends_nothing_stale() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config(StackMode::Ms));
    let phy = RecordingPhy::new();
    let mut l1s = test.attach_l1(Box::new(phy.clone()));
    test.populate_entities(vec![GsmEntity::Lapdm], vec![GsmEntity::Rr, GsmEntity::Sms]);
    l1s.enable_task(MframeTask::Sdcch8_0);

    let sdcch = chan_nr(cbits::SDCCH8, 0);
    let from_rr = |sap, msg| SapMsg::new(sap, GsmEntity::Rr, GsmEntity::Lapdm, FrameNumber::default(), msg);
    let from_l1 = |payload: Vec<u8>| {
        let ind = PhDataInd { chan_nr: sdcch, link_id: 0, fnr: FrameNumber::new(1), payload, quality: SignalQuality::default() };
        SapMsg::new(Sap::PhSap, GsmEntity::L1, GsmEntity::Lapdm, FrameNumber::new(1), SapMsgInner::PhDataInd(ind))
    };

    test.submit_message(from_rr(Sap::Control, SapMsgInner::LapdmControl(LapdmControl::ActivateChannel { chan_nr: sdcch })));
    let req = DlEstablishReq { chan_nr: sdcch, link_id: 0, l3: None };
    test.submit_message(from_rr(Sap::DlSap, SapMsgInner::DlEstablishReq(req)));
    test.tick();
    test.submit_message(from_l1(block(&[0x01, 0x73, 0x01])));
    test.tick();
    let req = DlDataReq { chan_nr: sdcch, link_id: 0, l3: vec![0x05, 0x08] };
    test.submit_message(from_rr(Sap::DlSap, SapMsgInner::DlDataReq(req)));
    test.tick();

    // The network releases before the first uplink opportunity
    test.submit_message(from_l1(block(&[0x03, 0x53, 0x01])));
    test.tick();
    let msgs = test.dump_sink(GsmEntity::Rr);
    assert!(msgs.iter().any(|m| matches!(m.msg, SapMsgInner::DlReleaseInd(DlReleaseInd { cause: ReleaseCause::PeerDisc, .. }))));
    {
        let entity = test.router.get_entity(GsmEntity::Lapdm).unwrap();
        let lapdm = entity.as_any_mut().downcast_mut::<Lapdm>().unwrap();
        assert_eq!(lapdm.channel(sdcch).unwrap().dcch.datalink(0).unwrap().state(), DlState::Idle);
    }

    // Neither the SABM nor the I-frame leave after the release, only the UA
    run_frames(&mut l1s, 0..=120);
    let sdcch_blocks: Vec<(u32, Vec<u8>)> = phy
        .take_bursts()
        .into_iter()
        .filter(|b| b.fnr.get() % 51 == 15)
        .map(|b| (b.fnr.get(), b.payload))
        .collect();
    let fill = block(&[0x01, 0x03, 0x01]);
    assert_eq!(sdcch_blocks, vec![(15, block(&[0x03, 0x73, 0x01])), (66, fill.clone()), (117, fill)]);
}
