mod common;

use gsm_config::StackMode;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{ChanNr, FrameNumber, LinkId, Sap, SignalQuality, cbits, chan_nr, debug, link_id};
use gsm_entities::lapdm::{DlState, Lapdm};
use gsm_saps::control::LapdmControl;
use gsm_saps::dl::*;
use gsm_saps::ph::{PhDataInd, PhDataReq};
use gsm_saps::{SapMsg, SapMsgInner};

use common::{ComponentTest, default_test_config};

/// A MS and a BTS LAPDm layer, connected back to back on one dedicated channel
struct Link {
    ms: ComponentTest,
    bts: ComponentTest,
    chan_nr: ChanNr,
    /// Blocks carried in either direction
    carried: usize,
}

impl Link {
    fn new() -> Self {
        debug::setup_logging_verbose();
        let chan_nr = chan_nr(cbits::SDCCH4 + 1, 0);
        let mut ms = ComponentTest::new(default_test_config(StackMode::Ms));
        let mut bts = ComponentTest::new(default_test_config(StackMode::Bts));
        for side in [&mut ms, &mut bts] {
            side.populate_entities(vec![GsmEntity::Lapdm], vec![GsmEntity::L1, GsmEntity::Rr, GsmEntity::Sms]);
            let ctrl = LapdmControl::ActivateChannel { chan_nr };
            side.submit_message(from_rr(Sap::Control, SapMsgInner::LapdmControl(ctrl)));
            side.tick();
        }
        Link { ms, bts, chan_nr, carried: 0 }
    }

    /// Moves PH-DATA requests of each side to the other until both are quiet
    fn pump(&mut self) {
        for _ in 0..64 {
            let ms_tx = Self::take_tx(&mut self.ms);
            let bts_tx = Self::take_tx(&mut self.bts);
            if ms_tx.is_empty() && bts_tx.is_empty() {
                return;
            }
            self.carried += ms_tx.len() + bts_tx.len();
            for req in ms_tx {
                Self::deliver(&mut self.bts, req);
            }
            for req in bts_tx {
                Self::deliver(&mut self.ms, req);
            }
            self.ms.tick();
            self.bts.tick();
        }
        panic!("link did not settle");
    }

    fn take_tx(side: &mut ComponentTest) -> Vec<PhDataReq> {
        side.dump_sink(GsmEntity::L1)
            .into_iter()
            .filter_map(|msg| match msg.msg {
                SapMsgInner::PhDataReq(req) => Some(req),
                // Blocks are carried at once, nothing waits in layer 1
                SapMsgInner::PhFlushReq(_) => None,
                other => panic!("unexpected {}", other),
            })
            .collect()
    }

    fn deliver(side: &mut ComponentTest, req: PhDataReq) {
        let fnr = FrameNumber::new(500);
        let ind = PhDataInd { chan_nr: req.chan_nr, link_id: req.link_id, fnr, payload: req.payload, quality: SignalQuality::default() };
        side.submit_message(SapMsg::new(Sap::PhSap, GsmEntity::L1, GsmEntity::Lapdm, fnr, SapMsgInner::PhDataInd(ind)));
    }

    fn request(side: &mut ComponentTest, msg: SapMsgInner) {
        side.submit_message(from_rr(Sap::DlSap, msg));
        side.tick();
    }

    fn establish(&mut self, l3: Option<Vec<u8>>) {
        let req = DlEstablishReq { chan_nr: self.chan_nr, link_id: 0, l3 };
        Self::request(&mut self.ms, SapMsgInner::DlEstablishReq(req));
        self.pump();
    }
}

fn from_rr(sap: Sap, msg: SapMsgInner) -> SapMsg {
    SapMsg::new(sap, GsmEntity::Rr, GsmEntity::Lapdm, FrameNumber::default(), msg)
}

fn dl_state(side: &mut ComponentTest, chan_nr: ChanNr, link_id: LinkId) -> DlState {
    let entity = side.router.get_entity(GsmEntity::Lapdm).unwrap();
    let lapdm = entity.as_any_mut().downcast_mut::<Lapdm>().unwrap();
    let channel = lapdm.channel(chan_nr).unwrap();
    let sacch = gsm_core::link_id_is_sacch(link_id);
    channel.entity(sacch).datalink(gsm_core::link_id_sapi(link_id)).unwrap().state()
}

#[test]
fn test_establish_with_contention_resolution() {
    let mut link = Link::new();
    let initial = vec![0x06, 0x27, 0x07, 0x03, 0x50, 0x59, 0x26];
    link.establish(Some(initial.clone()));

    let msgs = link.bts.dump_sink(GsmEntity::Rr);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(&msgs[0].msg, SapMsgInner::DlEstablishInd(DlEstablishInd { l3: Some(l3), .. }) if l3 == &initial));

    let msgs = link.ms.dump_sink(GsmEntity::Rr);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0].msg, SapMsgInner::DlEstablishConf(_)));

    // SABM and UA
    assert_eq!(link.carried, 2);
    assert_eq!(dl_state(&mut link.ms, link.chan_nr, 0), DlState::MfEst);
    assert_eq!(dl_state(&mut link.bts, link.chan_nr, 0), DlState::MfEst);
}

#[test]
fn test_segmented_message_both_directions() {
    let mut link = Link::new();
    link.establish(None);
    link.ms.dump_sinks();
    link.bts.dump_sinks();

    // 45 octets take three I-frames on the SDCCH
    let long: Vec<u8> = (0..45).collect();
    let req = DlDataReq { chan_nr: link.chan_nr, link_id: 0, l3: long.clone() };
    Link::request(&mut link.ms, SapMsgInner::DlDataReq(req));
    link.pump();

    let msgs = link.bts.dump_sink(GsmEntity::Rr);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(&msgs[0].msg, SapMsgInner::DlDataInd(DlDataInd { l3, .. }) if l3 == &long));

    // Two messages queued at once arrive in order
    let first = vec![0x06, 0x35, 0x01];
    let second: Vec<u8> = (100..130).collect();
    for l3 in [first.clone(), second.clone()] {
        let req = DlDataReq { chan_nr: link.chan_nr, link_id: 0, l3 };
        Link::request(&mut link.bts, SapMsgInner::DlDataReq(req));
    }
    link.pump();

    let received: Vec<Vec<u8>> = link
        .ms
        .dump_sink(GsmEntity::Rr)
        .into_iter()
        .filter_map(|msg| match msg.msg {
            SapMsgInner::DlDataInd(ind) => Some(ind.l3),
            _ => None,
        })
        .collect();
    assert_eq!(received, vec![first, second]);
}

#[test]
fn test_sacch_unit_data_carries_l1_header() {
    let mut link = Link::new();
    {
        let mut state = link.bts.config.state_write();
        state.ms_power = 7;
        state.timing_advance = 12;
    }

    // Measurement report style UI on the uplink SACCH
    let report = vec![0x06, 0x15, 0x3b, 0x3b];
    let req = DlUnitDataReq { chan_nr: link.chan_nr, link_id: link_id(0, true), l3: report.clone() };
    Link::request(&mut link.ms, SapMsgInner::DlUnitDataReq(req));
    // System information on the downlink SACCH, sent as B4 frame
    let si = vec![0x49, 0x06, 0x1d, 0x9f];
    let req = DlUnitDataReq { chan_nr: link.chan_nr, link_id: link_id(0, true), l3: si.clone() };
    Link::request(&mut link.bts, SapMsgInner::DlUnitDataReq(req));
    link.pump();

    let msgs = link.bts.dump_sink(GsmEntity::Rr);
    assert!(matches!(&msgs[0].msg, SapMsgInner::DlUnitDataInd(DlUnitDataInd { link_id: 0x40, l3, .. }) if l3 == &report));

    // Without a length octet the padding reaches layer 3
    let msgs = link.ms.dump_sink(GsmEntity::Rr);
    let SapMsgInner::DlUnitDataInd(ind) = &msgs[0].msg else { panic!("unexpected {}", msgs[0].msg) };
    assert_eq!(ind.link_id, 0x40);
    assert_eq!(ind.l3.len(), 19);
    assert!(ind.l3.starts_with(&si));

    let state = link.ms.config.state_read().clone();
    assert_eq!((state.ms_power, state.timing_advance), (7, 12));
}

#[test]
fn test_network_release() {
    let mut link = Link::new();
    link.establish(None);
    link.ms.dump_sinks();
    link.bts.dump_sinks();

    let req = DlReleaseReq { chan_nr: link.chan_nr, link_id: 0, mode: ReleaseMode::Normal };
    Link::request(&mut link.bts, SapMsgInner::DlReleaseReq(req));
    link.pump();

    let msgs = link.bts.dump_sink(GsmEntity::Rr);
    assert!(matches!(msgs.as_slice(), [SapMsg { msg: SapMsgInner::DlReleaseConf(_), .. }]));
    let msgs = link.ms.dump_sink(GsmEntity::Rr);
    assert!(matches!(
        msgs.as_slice(),
        [SapMsg { msg: SapMsgInner::DlReleaseInd(DlReleaseInd { cause: ReleaseCause::PeerDisc, .. }), .. }]
    ));
    assert_eq!(dl_state(&mut link.ms, link.chan_nr, 0), DlState::Idle);
    assert_eq!(dl_state(&mut link.bts, link.chan_nr, 0), DlState::Idle);
}

#[test]
fn test_sms_on_sapi3_beside_sapi0() {
    let mut link = Link::new();
    link.establish(None);

    let req = DlEstablishReq { chan_nr: link.chan_nr, link_id: 0x03, l3: None };
    Link::request(&mut link.bts, SapMsgInner::DlEstablishReq(req));
    link.pump();
    assert!(matches!(link.ms.dump_sink(GsmEntity::Sms)[0].msg, SapMsgInner::DlEstablishInd(_)));

    let cp_data = vec![0x09, 0x01, 0x23, 0x01, 0x00];
    let req = DlDataReq { chan_nr: link.chan_nr, link_id: 0x03, l3: cp_data.clone() };
    Link::request(&mut link.bts, SapMsgInner::DlDataReq(req));
    link.pump();

    let msgs = link.ms.dump_sink(GsmEntity::Sms);
    assert!(matches!(&msgs[0].msg, SapMsgInner::DlDataInd(DlDataInd { link_id: 0x03, l3, .. }) if l3 == &cp_data));
    assert_eq!(dl_state(&mut link.ms, link.chan_nr, 0), DlState::MfEst);
    assert_eq!(dl_state(&mut link.ms, link.chan_nr, 0x03), DlState::MfEst);
}
