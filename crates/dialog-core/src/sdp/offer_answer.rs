//! SDP Offer/Answer Model Implementation
//!
//! [`SdpNegotiator`] tracks one offer/answer exchange at a time for a single
//! INVITE session, as described by RFC 3264. It keeps the last successfully
//! negotiated local and remote SDP (the *active* pair) and the SDP currently
//! being negotiated.
//!
//! ## Offer/Answer Flow
//!
//! ```text
//! We offer                               They offer
//!
//! create_with_local_offer                create_with_remote_offer
//!   or modify/send_local_offer             or set_remote_offer
//!        |  LocalOffer                          |  RemoteOffer
//! set_remote_answer                      set_local_answer
//!        |  WaitNego                            |  WaitNego
//!    negotiate ------------> Done <--------- negotiate
//! ```
//!
//! `negotiate` always ends in `Done`. The active pair only changes when
//! negotiation succeeds, so a failed exchange leaves the previous media
//! session in place.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sipneg_sip_core::sdp_prelude::*;
use tracing::{debug, info, warn};

use super::format_match::{fmt_match, FormatMatcher, FormatMatcherRegistry};
use super::matching::{clone_deactivate, create_answer, process_answer, MatchOptions};
use crate::config::NegotiatorConfig;
use crate::errors::{NegotiationError, NegotiationResult};

/// Negotiator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiatorState {
    Null,
    LocalOffer,
    RemoteOffer,
    WaitNego,
    Done,
}

impl NegotiatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiatorState::Null => "STATE_NULL",
            NegotiatorState::LocalOffer => "STATE_LOCAL_OFFER",
            NegotiatorState::RemoteOffer => "STATE_REMOTE_OFFER",
            NegotiatorState::WaitNego => "STATE_WAIT_NEGO",
            NegotiatorState::Done => "STATE_DONE",
        }
    }
}

impl fmt::Display for NegotiatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SDP offer/answer negotiator for one session
#[derive(Debug, Clone)]
pub struct SdpNegotiator {
    state: NegotiatorState,
    prefer_remote_codec_order: bool,
    answer_with_multiple_codecs: bool,
    has_remote_answer: bool,
    answer_was_remote: bool,

    /// Our capability, used to answer offers
    initial_sdp: Option<SdpSession>,
    /// Capability to restore when the current exchange fails
    initial_sdp_backup: Option<SdpSession>,

    active_local_sdp: Option<SdpSession>,
    active_remote_sdp: Option<SdpSession>,

    neg_local_sdp: Option<SdpSession>,
    neg_remote_sdp: Option<SdpSession>,

    /// Last SDP we sent, offer or answer
    last_sent_sdp: Option<SdpSession>,

    matchers: FormatMatcherRegistry,
}

impl SdpNegotiator {
    fn with_config(config: &NegotiatorConfig, state: NegotiatorState) -> Self {
        Self {
            state,
            prefer_remote_codec_order: config.prefer_remote_codec_order,
            answer_with_multiple_codecs: config.answer_with_multiple_codecs,
            has_remote_answer: false,
            answer_was_remote: false,
            initial_sdp: None,
            initial_sdp_backup: None,
            active_local_sdp: None,
            active_remote_sdp: None,
            neg_local_sdp: None,
            neg_remote_sdp: None,
            last_sent_sdp: None,
            matchers: FormatMatcherRegistry::new(),
        }
    }

    /// Start a negotiation where we send the first offer
    pub fn create_with_local_offer(
        config: &NegotiatorConfig,
        local: &SdpSession,
    ) -> NegotiationResult<Self> {
        validate_sdp(local, true)?;

        let mut neg = Self::with_config(config, NegotiatorState::LocalOffer);
        neg.initial_sdp = Some(local.clone());
        neg.neg_local_sdp = Some(local.clone());
        neg.last_sent_sdp = Some(local.clone());

        debug!("negotiator created with local offer, version {}", local.origin.sess_version);
        Ok(neg)
    }

    /// Start a negotiation from a received offer
    ///
    /// With an `initial` capability the negotiator is ready to
    /// [`negotiate`](Self::negotiate) straight away; without one the caller
    /// must supply an answer through [`set_local_answer`](Self::set_local_answer).
    pub fn create_with_remote_offer(
        config: &NegotiatorConfig,
        initial: Option<&SdpSession>,
        remote: &SdpSession,
    ) -> NegotiationResult<Self> {
        validate_sdp(remote, false)?;

        let mut neg = Self::with_config(config, NegotiatorState::RemoteOffer);
        neg.neg_remote_sdp = Some(remote.clone());

        if let Some(initial) = initial {
            validate_sdp(initial, true)?;
            neg.initial_sdp = Some(initial.clone());
            neg.neg_local_sdp = Some(initial.clone());
            neg.state = NegotiatorState::WaitNego;
        }

        debug!("negotiator created with remote offer, state {}", neg.state);
        Ok(neg)
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[NegotiatorState],
    ) -> NegotiationResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            warn!("{} rejected in {}", operation, self.state);
            Err(NegotiationError::state_violation(operation, self.state))
        }
    }

    fn differs_from_last_sent(&self, sdp: &SdpSession) -> bool {
        self.last_sent_sdp
            .as_ref()
            .is_none_or(|last| !last.same_content_as(sdp))
    }

    /// Replace our offer for the next exchange
    ///
    /// Media lines of the currently active SDP keep their positions: a line
    /// that moved is put back at its old index, and a line that disappeared
    /// is kept as a rejected line. The origin carries over from the active
    /// SDP with its version incremented.
    pub fn modify_local_offer(&mut self, local: &SdpSession) -> NegotiationResult<()> {
        self.require("modify_local_offer", &[NegotiatorState::Done])?;
        validate_sdp(local, true)?;

        let mut new_offer = local.clone();

        match self.active_local_sdp.as_ref() {
            None => {
                if self.differs_from_last_sent(&new_offer) {
                    new_offer.origin.sess_version = new_offer.origin.sess_version.wrapping_add(1);
                }
                self.initial_sdp = Some(local.clone());
                self.initial_sdp_backup = None;
            }
            Some(old) => {
                let origin = &mut new_offer.origin;
                origin.username = old.origin.username.clone();
                origin.sess_id = old.origin.sess_id;
                origin.net_type = old.origin.net_type.clone();
                origin.addr_type = old.origin.addr_type.clone();
                origin.unicast_address = old.origin.unicast_address.clone();
                origin.sess_version = old.origin.sess_version.wrapping_add(1);

                for (oi, om) in old.media.iter().enumerate() {
                    let found = (oi..new_offer.media.len()).find(|&ni| {
                        let nm = &new_offer.media[ni];
                        nm.media == om.media && transport_compare(&nm.protocol, &om.protocol)
                    });
                    match found {
                        Some(ni) if ni != oi => {
                            let m = new_offer.media.remove(ni);
                            new_offer.media.insert(oi, m);
                        }
                        Some(_) => {}
                        None => {
                            debug!("keeping removed {} line {} as rejected", om.media, oi);
                            new_offer.media.insert(oi, clone_deactivate(om, om, local));
                        }
                    }
                }

                self.initial_sdp_backup = self.initial_sdp.take();
                self.initial_sdp = Some(new_offer.clone());
            }
        }

        info!("local offer modified, version {}", new_offer.origin.sess_version);
        self.last_sent_sdp = Some(new_offer.clone());
        self.neg_local_sdp = Some(new_offer);
        self.state = NegotiatorState::LocalOffer;
        Ok(())
    }

    /// Offer to send next
    ///
    /// From `Done` this re-offers the active local SDP (a refresh or a
    /// session timer re-INVITE), bumping its version if it differs from what
    /// was last sent. From `LocalOffer` it returns the pending offer.
    pub fn send_local_offer(&mut self) -> NegotiationResult<SdpSession> {
        match self.state {
            NegotiatorState::Done => {
                let active = self
                    .active_local_sdp
                    .as_ref()
                    .ok_or(NegotiationError::NoActiveSession)?;
                let mut offer = active.clone();
                if self.differs_from_last_sent(&offer) {
                    offer.origin.sess_version = offer.origin.sess_version.wrapping_add(1);
                }

                self.initial_sdp_backup = self.initial_sdp.clone();
                self.neg_local_sdp = Some(offer.clone());
                self.last_sent_sdp = Some(offer.clone());
                self.state = NegotiatorState::LocalOffer;
                Ok(offer)
            }
            NegotiatorState::LocalOffer => self
                .neg_local_sdp
                .clone()
                .ok_or(NegotiationError::NoActiveSession),
            state => Err(NegotiationError::state_violation("send_local_offer", state)),
        }
    }

    /// Record the answer received for our offer
    pub fn set_remote_answer(&mut self, remote: &SdpSession) -> NegotiationResult<()> {
        self.require("set_remote_answer", &[NegotiatorState::LocalOffer])?;
        validate_sdp(remote, false)?;

        self.neg_remote_sdp = Some(remote.clone());
        self.has_remote_answer = true;
        self.state = NegotiatorState::WaitNego;
        Ok(())
    }

    /// Record a new offer received within an established session
    pub fn set_remote_offer(&mut self, remote: &SdpSession) -> NegotiationResult<()> {
        self.require("set_remote_offer", &[NegotiatorState::Done])?;
        validate_sdp(remote, false)?;

        self.neg_remote_sdp = Some(remote.clone());
        self.state = NegotiatorState::RemoteOffer;
        Ok(())
    }

    /// Provide the capability to answer the pending remote offer with
    ///
    /// `None` answers from the initial SDP. A supplied SDP keeps the session
    /// id of the initial SDP when there is one, otherwise it becomes the
    /// initial SDP.
    pub fn set_local_answer(&mut self, local: Option<&SdpSession>) -> NegotiationResult<()> {
        self.require(
            "set_local_answer",
            &[NegotiatorState::RemoteOffer, NegotiatorState::WaitNego],
        )?;

        match local {
            Some(local) => {
                validate_sdp(local, true)?;
                let mut answer = local.clone();
                match self.initial_sdp.as_ref() {
                    Some(initial) => {
                        answer.origin.sess_id = initial.origin.sess_id;
                        self.initial_sdp_backup = Some(initial.clone());
                    }
                    None => self.initial_sdp = Some(local.clone()),
                }
                self.neg_local_sdp = Some(answer);
            }
            None => {
                let initial = self.initial_sdp.clone().ok_or(NegotiationError::NoInitialSdp)?;
                self.initial_sdp_backup = Some(initial.clone());
                self.neg_local_sdp = Some(initial);
            }
        }

        self.state = NegotiatorState::WaitNego;
        Ok(())
    }

    /// Abandon our pending offer
    pub fn cancel_offer(&mut self) -> NegotiationResult<()> {
        self.require("cancel_offer", &[NegotiatorState::LocalOffer])?;

        if let Some(backup) = self.initial_sdp_backup.take() {
            self.initial_sdp = Some(backup);
        }
        self.neg_local_sdp = None;
        self.neg_remote_sdp = None;
        self.has_remote_answer = false;
        self.state = NegotiatorState::Done;

        debug!("pending local offer cancelled");
        Ok(())
    }

    /// Complete the pending exchange
    ///
    /// Outside `WaitNego` this is a state violation that changes nothing.
    /// Otherwise the negotiator is in `Done` afterwards whatever the outcome.
    pub fn negotiate(&mut self, allow_asymmetric_media: bool) -> NegotiationResult<()> {
        self.require("negotiate", &[NegotiatorState::WaitNego])?;

        let local = self.neg_local_sdp.take();
        let remote = self.neg_remote_sdp.take();

        let result = match (local, remote) {
            (Some(local), Some(remote)) if self.has_remote_answer => {
                process_answer(&self.matchers, &local, &remote, allow_asymmetric_media)
            }
            (Some(local), Some(remote)) => self
                .build_answer(&local, &remote)
                .map(|answer| (answer, remote)),
            (None, _) => Err(NegotiationError::NoInitialSdp),
            (_, None) => Err(NegotiationError::NoActiveSession),
        };

        let outcome = match result {
            Ok((active_local, active_remote)) => {
                info!(
                    "negotiation complete, {} active media line(s)",
                    active_local.active_media_count()
                );
                if !self.has_remote_answer {
                    self.last_sent_sdp = Some(active_local.clone());
                }
                self.active_local_sdp = Some(active_local);
                self.active_remote_sdp = Some(active_remote);
                Ok(())
            }
            Err(e) => {
                warn!("negotiation failed: {}", e);
                if let Some(backup) = self.initial_sdp_backup.take() {
                    self.initial_sdp = Some(backup);
                }
                Err(e)
            }
        };

        self.state = NegotiatorState::Done;
        self.answer_was_remote = self.has_remote_answer;
        self.initial_sdp_backup = None;
        self.has_remote_answer = false;

        outcome
    }

    /// Origin version is bumped only when the answer differs from the last SDP sent
    fn build_answer(&self, capability: &SdpSession, offer: &SdpSession) -> NegotiationResult<SdpSession> {
        let options = MatchOptions {
            prefer_remote_codec_order: self.prefer_remote_codec_order,
            answer_with_multiple_codecs: self.answer_with_multiple_codecs,
        };
        let mut answer = create_answer(&self.matchers, options, capability, offer)?;

        if let Some(base) = self.active_local_sdp.as_ref().or(self.initial_sdp.as_ref()) {
            answer.origin = base.origin.clone();
        }
        if let Some(last) = self.last_sent_sdp.as_ref() {
            answer.origin.sess_version = last.origin.sess_version;
        }
        if self.differs_from_last_sent(&answer) {
            answer.origin.sess_version = answer.origin.sess_version.wrapping_add(1);
        }
        Ok(answer)
    }

    /// Register a codec-specific format matcher for this negotiator
    pub fn register_format_matcher(
        &mut self,
        encoding_name: &str,
        matcher: Arc<dyn FormatMatcher>,
    ) -> Option<Arc<dyn FormatMatcher>> {
        self.matchers.register(encoding_name, matcher)
    }

    pub fn unregister_format_matcher(&mut self, encoding_name: &str) -> Option<Arc<dyn FormatMatcher>> {
        self.matchers.unregister(encoding_name)
    }

    /// Compare two formats with this negotiator's matchers
    pub fn fmt_match(
        &self,
        offer: &MediaDescription,
        offer_fmt_idx: usize,
        answer: &mut MediaDescription,
        answer_fmt_idx: usize,
        allow_modify_answer: bool,
    ) -> NegotiationResult<bool> {
        fmt_match(&self.matchers, offer, offer_fmt_idx, answer, answer_fmt_idx, allow_modify_answer)
    }

    pub fn state(&self) -> NegotiatorState {
        self.state
    }

    pub fn initial_sdp(&self) -> Option<&SdpSession> {
        self.initial_sdp.as_ref()
    }

    pub fn active_local(&self) -> Option<&SdpSession> {
        self.active_local_sdp.as_ref()
    }

    pub fn active_remote(&self) -> Option<&SdpSession> {
        self.active_remote_sdp.as_ref()
    }

    pub fn neg_local(&self) -> Option<&SdpSession> {
        self.neg_local_sdp.as_ref()
    }

    pub fn neg_remote(&self) -> Option<&SdpSession> {
        self.neg_remote_sdp.as_ref()
    }

    /// Whether the last completed exchange ended with an answer from the peer
    pub fn was_answer_remote(&self) -> bool {
        self.answer_was_remote
    }

    /// True while an answer of ours is prepared but not yet negotiated
    pub fn has_local_answer(&self) -> bool {
        self.state == NegotiatorState::WaitNego && !self.has_remote_answer
    }

    pub fn prefer_remote_codec_order(&self) -> bool {
        self.prefer_remote_codec_order
    }

    pub fn set_prefer_remote_codec_order(&mut self, prefer: bool) {
        self.prefer_remote_codec_order = prefer;
    }

    pub fn set_answer_multiple_codecs(&mut self, multiple: bool) {
        self.answer_with_multiple_codecs = multiple;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NegotiationErrorKind;
    use std::str::FromStr;

    fn sdp(text: &str) -> SdpSession {
        SdpSession::from_str(&text.replace('\n', "\r\n")).unwrap()
    }

    fn alice_offer() -> SdpSession {
        sdp("v=0
o=alice 2890844526 2890844526 IN IP4 10.0.0.1
s=-
c=IN IP4 10.0.0.1
t=0 0
m=audio 49170 RTP/AVP 0 8 97
a=rtpmap:97 iLBC/8000
m=video 51372 RTP/AVP 31 32
")
    }

    fn bob_capability() -> SdpSession {
        sdp("v=0
o=bob 2808844564 2808844564 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 49174 RTP/AVP 0
m=video 49170 RTP/AVP 32
")
    }

    fn config() -> NegotiatorConfig {
        NegotiatorConfig::default()
    }

    #[test]
    fn test_state_names() {
        assert_eq!(NegotiatorState::Null.to_string(), "STATE_NULL");
        assert_eq!(NegotiatorState::LocalOffer.as_str(), "STATE_LOCAL_OFFER");
        assert_eq!(NegotiatorState::RemoteOffer.as_str(), "STATE_REMOTE_OFFER");
        assert_eq!(NegotiatorState::WaitNego.as_str(), "STATE_WAIT_NEGO");
        assert_eq!(NegotiatorState::Done.as_str(), "STATE_DONE");
    }

    #[test]
    fn test_local_offer_exchange() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        assert_eq!(neg.state(), NegotiatorState::LocalOffer);

        let answer = sdp("v=0
o=bob 1 1 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 49174 RTP/AVP 0
m=video 49170 RTP/AVP 32
");
        neg.set_remote_answer(&answer).unwrap();
        assert_eq!(neg.state(), NegotiatorState::WaitNego);
        assert!(!neg.has_local_answer());

        neg.negotiate(false).unwrap();
        assert_eq!(neg.state(), NegotiatorState::Done);
        assert!(neg.was_answer_remote());

        let local = neg.active_local().unwrap();
        assert_eq!(local.media[0].formats, vec!["0"]);
        assert!(local.media[0].rtpmap("97").is_none());
        assert_eq!(local.media[1].formats, vec!["32"]);
        assert_eq!(neg.active_remote().unwrap().origin.username, "bob");
        assert!(neg.neg_local().is_none());
        assert!(neg.neg_remote().is_none());
    }

    #[test]
    fn test_remote_offer_exchange() {
        let mut neg =
            SdpNegotiator::create_with_remote_offer(&config(), Some(&bob_capability()), &alice_offer())
                .unwrap();
        assert_eq!(neg.state(), NegotiatorState::WaitNego);
        assert!(neg.has_local_answer());

        neg.negotiate(false).unwrap();
        assert!(!neg.was_answer_remote());

        let answer = neg.active_local().unwrap();
        assert_eq!(answer.origin.username, "bob");
        assert_eq!(answer.origin.sess_version, 2808844565);
        assert_eq!(answer.media.len(), 2);
        assert_eq!(answer.media[0].formats, vec!["0"]);
        assert_eq!(answer.media[1].formats, vec!["32"]);
    }

    #[test]
    fn test_remote_offer_without_capability_needs_local_answer() {
        let mut neg = SdpNegotiator::create_with_remote_offer(&config(), None, &alice_offer()).unwrap();
        assert_eq!(neg.state(), NegotiatorState::RemoteOffer);
        assert!(!neg.has_local_answer());

        assert_eq!(neg.set_local_answer(None), Err(NegotiationError::NoInitialSdp));

        let err = neg.negotiate(false).unwrap_err();
        assert_eq!(err.kind(), NegotiationErrorKind::StateViolation);
        assert_eq!(neg.state(), NegotiatorState::RemoteOffer);

        neg.set_local_answer(Some(&bob_capability())).unwrap();
        assert_eq!(neg.initial_sdp().unwrap().origin.username, "bob");
        neg.negotiate(false).unwrap();
        assert_eq!(neg.state(), NegotiatorState::Done);
    }

    #[test]
    fn test_set_local_answer_keeps_session_id() {
        let mut neg =
            SdpNegotiator::create_with_remote_offer(&config(), Some(&bob_capability()), &alice_offer())
                .unwrap();
        let mut other = bob_capability();
        other.origin.sess_id = 42;
        neg.set_local_answer(Some(&other)).unwrap();
        assert_eq!(neg.neg_local().unwrap().origin.sess_id, 2808844564);
    }

    #[test]
    fn test_failed_answer_keeps_previous_session() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        neg.set_remote_answer(&bob_capability()).unwrap();
        neg.negotiate(false).unwrap();
        let active = neg.active_local().cloned();

        neg.send_local_offer().unwrap();
        let bad = sdp("v=0
o=bob 1 2 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 49174 RTP/AVP 18
m=video 49170 RTP/AVP 34
");
        neg.set_remote_answer(&bad).unwrap();
        assert_eq!(neg.negotiate(false), Err(NegotiationError::NoActiveMedia));
        assert_eq!(neg.state(), NegotiatorState::Done);
        assert_eq!(neg.active_local().cloned(), active);
    }

    #[test]
    fn test_state_violations() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        assert!(matches!(
            neg.set_remote_offer(&bob_capability()),
            Err(NegotiationError::StateViolation { operation: "set_remote_offer", .. })
        ));
        assert!(neg.modify_local_offer(&alice_offer()).is_err());
        assert!(neg.set_local_answer(None).is_err());
        assert_eq!(neg.state(), NegotiatorState::LocalOffer);
    }

    #[test]
    fn test_invalid_sdp_is_rejected() {
        let mut broken = alice_offer();
        broken.media[0].attributes.clear();
        let err = SdpNegotiator::create_with_local_offer(&config(), &broken).unwrap_err();
        assert_eq!(err.kind(), NegotiationErrorKind::StructuralValidation);
    }

    #[test]
    fn test_cancel_offer_restores_done() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        neg.set_remote_answer(&bob_capability()).unwrap();
        neg.negotiate(false).unwrap();

        let offer = neg.send_local_offer().unwrap();
        assert_eq!(neg.send_local_offer().unwrap(), offer);
        neg.cancel_offer().unwrap();
        assert_eq!(neg.state(), NegotiatorState::Done);
        assert!(neg.neg_local().is_none());
        assert!(neg.cancel_offer().is_err());
    }

    #[test]
    fn test_send_local_offer_without_active_session() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        neg.set_remote_answer(&sdp("v=0
o=bob 1 1 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 0 RTP/AVP 0
m=video 0 RTP/AVP 31
"))
        .unwrap();
        assert!(neg.negotiate(false).is_err());
        assert_eq!(neg.send_local_offer(), Err(NegotiationError::NoActiveSession));
    }

    #[test]
    fn test_modify_local_offer_keeps_line_positions() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        neg.set_remote_answer(&bob_capability()).unwrap();
        neg.negotiate(false).unwrap();
        let old_version = neg.active_local().unwrap().origin.sess_version;

        // Video dropped, audio only
        let audio_only = sdp("v=0
o=someone 7 7 IN IP4 10.0.0.9
s=-
c=IN IP4 10.0.0.1
t=0 0
m=audio 49170 RTP/AVP 8
");
        neg.modify_local_offer(&audio_only).unwrap();
        assert_eq!(neg.state(), NegotiatorState::LocalOffer);

        let offer = neg.neg_local().unwrap();
        assert_eq!(offer.media.len(), 2);
        assert_eq!(offer.media[0].media, "audio");
        assert!(offer.media[0].is_active());
        assert_eq!(offer.media[1].media, "video");
        assert_eq!(offer.media[1].port, 0);
        assert_eq!(offer.origin.username, "alice");
        assert_eq!(offer.origin.sess_id, 2890844526);
        assert_eq!(offer.origin.sess_version, old_version + 1);
    }

    #[test]
    fn test_modify_local_offer_moves_lines_back() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        neg.set_remote_answer(&bob_capability()).unwrap();
        neg.negotiate(false).unwrap();

        let swapped = sdp("v=0
o=alice 2890844526 2890844526 IN IP4 10.0.0.1
s=-
c=IN IP4 10.0.0.1
t=0 0
m=video 51372 RTP/AVP 31
m=audio 49170 RTP/AVP 0
m=audio 49180 RTP/AVP 8
");
        neg.modify_local_offer(&swapped).unwrap();
        let offer = neg.neg_local().unwrap();
        let kinds: Vec<&str> = offer.media.iter().map(|m| m.media.as_str()).collect();
        assert_eq!(kinds, vec!["audio", "video", "audio"]);
        assert_eq!(offer.media[0].port, 49170);
        assert_eq!(offer.media[2].port, 49180);
    }

    #[test]
    fn test_reanswer_without_changes_keeps_version() {
        let mut neg =
            SdpNegotiator::create_with_remote_offer(&config(), Some(&bob_capability()), &alice_offer())
                .unwrap();
        neg.negotiate(false).unwrap();
        let first = neg.active_local().unwrap().origin.sess_version;

        neg.set_remote_offer(&alice_offer()).unwrap();
        neg.set_local_answer(None).unwrap();
        neg.negotiate(false).unwrap();
        assert_eq!(neg.active_local().unwrap().origin.sess_version, first);
    }

    #[test]
    fn test_negotiator_fmt_match_uses_registered_matcher() {
        let mut neg = SdpNegotiator::create_with_local_offer(&config(), &alice_offer()).unwrap();
        neg.register_format_matcher(
            "iLBC",
            Arc::new(|_: &MediaDescription, _: usize, _: &mut MediaDescription, _: usize, _: bool| false),
        );

        let offer = &alice_offer().media[0];
        let mut answer = offer.clone();
        assert!(!neg.fmt_match(offer, 2, &mut answer, 2, false).unwrap());
        assert!(neg.fmt_match(offer, 0, &mut answer, 0, false).unwrap());

        assert!(neg.unregister_format_matcher("ilbc").is_some());
        assert!(neg.fmt_match(offer, 2, &mut answer, 2, false).unwrap());
    }
}
