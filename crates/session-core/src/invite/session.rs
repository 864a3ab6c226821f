//! INVITE session usage
//!
//! ```text
//! Dialog ──on_rx_request/on_rx_response──> InviteSession ──> SdpNegotiator
//!                                               │
//!                                               └──> MediaChannel::update
//! ```
//!
//! Lock order is always dialog lock first, then the session's own mutex.
//! The session mutex is never held while calling back into the dialog.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use sipneg_dialog_core::{
    Dialog, NegotiationError, NegotiationResult, NegotiatorState, SdpNegotiator, TransactionKey,
    TransactionRole, TransactionState, Usage,
};
use sipneg_sip_core::sdp_prelude::{SdpSession, CONTENT_TYPE_SDP};
use sipneg_sip_core::{HeaderAccess, Method, Request, Response, StatusCode};

use super::state::InviteState;
use crate::config::SessionConfig;
use crate::errors::{SessionError, SessionResult};
use crate::media::MediaChannel;

/// Usage name under which INVITE sessions attach to their dialog
pub const INVITE_USAGE_NAME: &str = "mod-invite";

/// Dispatch priority of INVITE sessions
pub const INVITE_USAGE_PRIORITY: i32 = 32;

type SdpPair = (SdpSession, SdpSession);

struct InviteInner {
    state: InviteState,
    negotiator: Option<SdpNegotiator>,
    media: Option<Arc<dyn MediaChannel>>,
    released: bool,
}

impl InviteInner {
    fn set_state(&mut self, state: InviteState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "INVITE session state changed");
            self.state = state;
        }
    }
}

/// An INVITE session bound to one dialog
pub struct InviteSession {
    dialog: Arc<Dialog>,
    config: SessionConfig,
    inner: Mutex<InviteInner>,
}

/// Parse the body as SDP when the Content-Type says it is SDP
fn sdp_body(content_type: Option<&str>, body: &[u8]) -> SessionResult<Option<SdpSession>> {
    if body.is_empty() {
        return Ok(None);
    }
    let is_sdp = content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(CONTENT_TYPE_SDP));
    if !is_sdp {
        return Ok(None);
    }
    let text = std::str::from_utf8(body)
        .map_err(|_| NegotiationError::InvalidSdp("SDP body is not UTF-8".to_string()))?;
    let sdp = text.parse::<SdpSession>().map_err(NegotiationError::from)?;
    Ok(Some(sdp))
}

fn active_pair(neg: &SdpNegotiator) -> Option<SdpPair> {
    Some((neg.active_local()?.clone(), neg.active_remote()?.clone()))
}

fn notify_media(media: Option<Arc<dyn MediaChannel>>, pair: Option<SdpPair>) {
    if let (Some(media), Some((local, remote))) = (media, pair) {
        media.update(&local, &remote);
    }
}

impl InviteSession {
    /// Create the session for an outgoing INVITE
    ///
    /// With `local_sdp` the INVITE will carry it as the offer.
    pub fn create_uac(
        dialog: &Arc<Dialog>,
        local_sdp: Option<&SdpSession>,
        config: SessionConfig,
    ) -> SessionResult<Arc<InviteSession>> {
        config
            .validate()
            .map_err(|message| SessionError::ConfigError { message })?;
        let negotiator = local_sdp
            .map(|sdp| SdpNegotiator::create_with_local_offer(&config.negotiator, sdp))
            .transpose()?;
        Self::attach(dialog, config, negotiator, InviteState::Null)
    }

    /// Create the session for a received INVITE
    ///
    /// An SDP body in the request is the remote offer, answered later from
    /// `local_sdp`. Without one, `local_sdp` becomes our offer and goes in
    /// the 2xx.
    pub fn create_uas(
        dialog: &Arc<Dialog>,
        request: &Request,
        local_sdp: Option<&SdpSession>,
        config: SessionConfig,
    ) -> SessionResult<Arc<InviteSession>> {
        config
            .validate()
            .map_err(|message| SessionError::ConfigError { message })?;
        if request.method != Method::Invite {
            return Err(SessionError::invalid_request(format!(
                "{} cannot start an INVITE session",
                request.method
            )));
        }

        let negotiator = match sdp_body(request.content_type(), &request.body)? {
            Some(remote) => Some(SdpNegotiator::create_with_remote_offer(
                &config.negotiator,
                local_sdp,
                &remote,
            )?),
            None => local_sdp
                .map(|sdp| SdpNegotiator::create_with_local_offer(&config.negotiator, sdp))
                .transpose()?,
        };
        Self::attach(dialog, config, negotiator, InviteState::Incoming)
    }

    fn attach(
        dialog: &Arc<Dialog>,
        config: SessionConfig,
        negotiator: Option<SdpNegotiator>,
        state: InviteState,
    ) -> SessionResult<Arc<InviteSession>> {
        let session = Arc::new(InviteSession {
            dialog: dialog.clone(),
            config,
            inner: Mutex::new(InviteInner {
                state,
                negotiator,
                media: None,
                released: false,
            }),
        });

        let usage: Arc<dyn Usage> = session.clone();
        dialog.with_lock(|d| -> SessionResult<()> {
            d.add_usage(&usage)?;
            d.inc_session();
            Ok(())
        })?;
        info!(dialog = %dialog.id(), %state, "INVITE session created");
        Ok(session)
    }

    pub fn dialog(&self) -> &Arc<Dialog> {
        &self.dialog
    }

    pub fn state(&self) -> InviteState {
        self.dialog.with_lock(|_| self.inner.lock().state)
    }

    pub fn negotiator_state(&self) -> Option<NegotiatorState> {
        self.dialog
            .with_lock(|_| self.inner.lock().negotiator.as_ref().map(SdpNegotiator::state))
    }

    pub fn active_local_sdp(&self) -> Option<SdpSession> {
        self.dialog.with_lock(|_| {
            let inner = self.inner.lock();
            inner.negotiator.as_ref().and_then(|n| n.active_local().cloned())
        })
    }

    pub fn active_remote_sdp(&self) -> Option<SdpSession> {
        self.dialog.with_lock(|_| {
            let inner = self.inner.lock();
            inner.negotiator.as_ref().and_then(|n| n.active_remote().cloned())
        })
    }

    /// Receive every negotiated SDP pair from now on
    pub fn set_media_channel(&self, channel: Arc<dyn MediaChannel>) {
        self.dialog.with_lock(|_| self.inner.lock().media = Some(channel));
    }

    fn allow_asymmetric(&self) -> bool {
        self.config.negotiator.allow_asymmetric_media
    }

    fn disconnect(&self) {
        let release = {
            let mut inner = self.inner.lock();
            inner.set_state(InviteState::Disconnected);
            !std::mem::replace(&mut inner.released, true)
        };
        if release {
            info!(dialog = %self.dialog.id(), "INVITE session disconnected");
            self.dialog.dec_session();
        }
    }

    /// Build the initial INVITE, carrying our offer when we have one
    pub fn invite(&self) -> SessionResult<Request> {
        self.dialog.with_lock(|dialog| {
            let offer = {
                let mut inner = self.inner.lock();
                if inner.state != InviteState::Null {
                    return Err(SessionError::InvalidState {
                        operation: "invite",
                        state: inner.state,
                    });
                }
                match inner.negotiator.as_mut() {
                    Some(neg) if neg.state() == NegotiatorState::LocalOffer => {
                        Some(neg.send_local_offer()?)
                    }
                    _ => None,
                }
            };

            let mut request = dialog.create_request(Method::Invite, None)?;
            if let Some(offer) = offer {
                request.set_body(CONTENT_TYPE_SDP, offer.to_bytes());
            }
            Ok(request)
        })
    }

    /// Build a re-INVITE offering `local_sdp`
    ///
    /// Media lines of the active session keep their positions in the offer.
    pub fn reinvite(&self, local_sdp: &SdpSession) -> SessionResult<Request> {
        self.dialog.with_lock(|dialog| {
            let offer = {
                let mut inner = self.inner.lock();
                if inner.state != InviteState::Confirmed {
                    return Err(SessionError::InvalidState {
                        operation: "reinvite",
                        state: inner.state,
                    });
                }
                match inner.negotiator.as_mut() {
                    Some(neg) => {
                        neg.modify_local_offer(local_sdp)?;
                        neg.send_local_offer()?
                    }
                    None => {
                        let mut neg =
                            SdpNegotiator::create_with_local_offer(&self.config.negotiator, local_sdp)?;
                        let offer = neg.send_local_offer()?;
                        inner.negotiator = Some(neg);
                        offer
                    }
                }
            };

            let mut request = dialog.create_request(Method::Invite, None)?;
            request.set_body(CONTENT_TYPE_SDP, offer.to_bytes());
            Ok(request)
        })
    }

    /// Build a BYE for an answered session
    pub fn bye(&self) -> SessionResult<Request> {
        self.dialog.with_lock(|dialog| {
            let state = self.inner.lock().state;
            if !matches!(state, InviteState::Connecting | InviteState::Confirmed) {
                return Err(SessionError::InvalidState {
                    operation: "bye",
                    state,
                });
            }
            Ok(dialog.create_request(Method::Bye, None)?)
        })
    }

    /// Send a request built by this session
    ///
    /// Sending the initial INVITE moves the session to `Calling`; sending a
    /// BYE disconnects it.
    pub fn send_request(&self, request: Request) -> SessionResult<Option<TransactionKey>> {
        self.dialog.with_lock(|dialog| {
            let method = request.method.clone();
            let key = dialog.send_request(request)?;
            match method {
                Method::Invite => {
                    let mut inner = self.inner.lock();
                    if inner.state == InviteState::Null {
                        inner.set_state(InviteState::Calling);
                    }
                }
                Method::Bye => self.disconnect(),
                _ => {}
            }
            Ok(key)
        })
    }

    /// Negotiation needed for a 101-299 answer to the initial INVITE
    ///
    /// Returns the SDP to attach and, when an exchange completed, the new
    /// active pair.
    fn local_answer(&self, neg: &mut SdpNegotiator) -> NegotiationResult<(Option<SdpSession>, Option<SdpPair>)> {
        if neg.state() == NegotiatorState::RemoteOffer {
            neg.set_local_answer(None)?;
        }
        match neg.state() {
            NegotiatorState::WaitNego => {
                neg.negotiate(self.allow_asymmetric())?;
                Ok((neg.active_local().cloned(), active_pair(neg)))
            }
            NegotiatorState::LocalOffer => Ok((Some(neg.send_local_offer()?), None)),
            NegotiatorState::Done => Ok((neg.active_local().cloned(), None)),
            _ => Ok((None, None)),
        }
    }

    /// Answer the initial INVITE with `status` and send the response
    ///
    /// A 101-299 response completes a pending offer/answer exchange and
    /// carries the answer. When the offer cannot be answered the configured
    /// rejection status (488 by default) is sent instead; the returned
    /// response is the one actually sent.
    pub fn answer(&self, request: &Request, status: StatusCode) -> SessionResult<Response> {
        self.dialog.with_lock(|dialog| {
            let (negotiated, media) = {
                let mut inner = self.inner.lock();
                if !matches!(inner.state, InviteState::Incoming | InviteState::Early) {
                    return Err(SessionError::InvalidState {
                        operation: "answer",
                        state: inner.state,
                    });
                }
                let code = status.as_u16();
                let negotiated = match inner.negotiator.as_mut() {
                    Some(neg) if (101..300).contains(&code) => self.local_answer(neg).map(Some),
                    _ => Ok(None),
                };
                (negotiated, inner.media.clone())
            };

            let (status, sdp) = match negotiated {
                Ok(Some((sdp, pair))) => {
                    notify_media(media, pair);
                    (status, sdp)
                }
                Ok(None) => (status, None),
                Err(e) => {
                    warn!(dialog = %dialog.id(), error = %e, "Cannot answer offer, rejecting");
                    (self.config.reject_status_on_failure, None)
                }
            };

            let mut response = dialog.create_response(request, status, None)?;
            if let Some(sdp) = sdp {
                response.set_body(CONTENT_TYPE_SDP, sdp.to_bytes());
            }
            dialog.send_response(request, response.clone())?;

            let code = status.as_u16();
            if code >= 300 {
                self.disconnect();
            } else if code > 100 {
                let next = if code >= 200 {
                    InviteState::Connecting
                } else {
                    InviteState::Early
                };
                self.inner.lock().set_state(next);
            }
            Ok(response)
        })
    }

    fn on_reinvite(&self, dialog: &Dialog, request: &Request) -> SessionResult<()> {
        let offer = sdp_body(request.content_type(), &request.body);

        let (status, sdp, pair, media) = {
            let mut inner = self.inner.lock();
            let media = inner.media.clone();
            match inner.negotiator.as_mut() {
                Some(neg) if neg.state() != NegotiatorState::Done => {
                    debug!(state = %neg.state(), "Offer/answer in progress, answering 491");
                    (StatusCode::REQUEST_PENDING, None, None, media)
                }
                Some(neg) => match offer {
                    Ok(Some(offer)) => {
                        let result = neg
                            .set_remote_offer(&offer)
                            .and_then(|_| neg.set_local_answer(None))
                            .and_then(|_| neg.negotiate(self.allow_asymmetric()));
                        match result {
                            Ok(()) => (StatusCode::OK, neg.active_local().cloned(), active_pair(neg), media),
                            Err(e) => {
                                warn!(error = %e, "re-INVITE offer rejected, keeping current media");
                                (self.config.reject_status_on_failure, None, None, media)
                            }
                        }
                    }
                    Ok(None) => match neg.send_local_offer() {
                        Ok(offer) => (StatusCode::OK, Some(offer), None, media),
                        Err(e) => {
                            warn!(error = %e, "No SDP to offer in re-INVITE answer");
                            (self.config.reject_status_on_failure, None, None, media)
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Unreadable SDP in re-INVITE");
                        (self.config.reject_status_on_failure, None, None, media)
                    }
                },
                None => {
                    warn!("re-INVITE for a session without SDP");
                    (self.config.reject_status_on_failure, None, None, media)
                }
            }
        };

        notify_media(media, pair);
        let body = sdp.map(|sdp| (CONTENT_TYPE_SDP, Bytes::from(sdp.to_bytes())));
        dialog.respond(request, status, body)?;
        Ok(())
    }

    fn on_ack(&self, request: &Request) -> SessionResult<()> {
        let answer = sdp_body(request.content_type(), &request.body)?;
        let (pair, media) = {
            let mut inner = self.inner.lock();
            if inner.state == InviteState::Connecting {
                inner.set_state(InviteState::Confirmed);
            }
            let media = inner.media.clone();
            let pair = match inner.negotiator.as_mut() {
                Some(neg) if neg.state() == NegotiatorState::LocalOffer => match answer {
                    Some(answer) => {
                        neg.set_remote_answer(&answer)?;
                        neg.negotiate(self.allow_asymmetric())?;
                        active_pair(neg)
                    }
                    None => {
                        debug!("ACK without answer, withdrawing offer");
                        neg.cancel_offer()?;
                        None
                    }
                },
                _ => None,
            };
            (pair, media)
        };
        notify_media(media, pair);
        Ok(())
    }

    fn on_bye(&self, dialog: &Dialog, request: &Request) -> SessionResult<()> {
        dialog.respond(request, StatusCode::OK, None)?;
        self.disconnect();
        Ok(())
    }

    fn on_invite_response(&self, dialog: &Dialog, response: &Response, cseq: u32) -> SessionResult<()> {
        let code = response.status().as_u16();
        let sdp = match sdp_body(response.content_type(), &response.body) {
            Ok(sdp) => sdp,
            Err(e) => {
                warn!(status = code, error = %e, "Unreadable SDP in INVITE response");
                None
            }
        };

        if code >= 300 {
            let early = {
                let mut inner = self.inner.lock();
                if let Some(neg) = inner.negotiator.as_mut() {
                    if neg.state() == NegotiatorState::LocalOffer {
                        neg.cancel_offer()?;
                    }
                }
                inner.state.is_early()
            };
            if early {
                self.disconnect();
            }
            return Ok(());
        }

        let (pair, media) = {
            let mut inner = self.inner.lock();
            let media = inner.media.clone();
            let mut pair = None;
            if let (Some(neg), Some(answer)) = (inner.negotiator.as_mut(), sdp.as_ref()) {
                if neg.state() == NegotiatorState::LocalOffer {
                    let result = neg
                        .set_remote_answer(answer)
                        .and_then(|_| neg.negotiate(self.allow_asymmetric()));
                    match result {
                        Ok(()) => pair = active_pair(neg),
                        Err(e) => warn!(status = code, error = %e, "Answer could not be applied"),
                    }
                }
            }
            if code >= 200 && inner.state.is_early() {
                inner.set_state(InviteState::Confirmed);
            } else if code > 100 && inner.state == InviteState::Calling {
                inner.set_state(InviteState::Early);
            }
            (pair, media)
        };
        notify_media(media, pair);

        if code >= 200 {
            let ack = dialog.create_request(Method::Ack, Some(cseq))?;
            dialog.send_request(ack)?;
        }
        Ok(())
    }
}

impl Usage for InviteSession {
    fn name(&self) -> &str {
        INVITE_USAGE_NAME
    }

    fn priority(&self) -> i32 {
        INVITE_USAGE_PRIORITY
    }

    fn on_rx_request(&self, dialog: &Dialog, request: &Request) -> bool {
        let result = match request.method {
            Method::Invite => self.on_reinvite(dialog, request),
            Method::Ack => self.on_ack(request),
            Method::Bye => self.on_bye(dialog, request),
            _ => return false,
        };
        if let Err(e) = result {
            warn!(request = %request.info(), error = %e, "INVITE session failed to handle request");
        }
        true
    }

    fn on_rx_response(&self, dialog: &Dialog, response: &Response) -> bool {
        let Some(cseq) = response.cseq() else {
            return false;
        };
        match cseq.method {
            Method::Invite => {
                if let Err(e) = self.on_invite_response(dialog, response, cseq.seq) {
                    warn!(status = %response.status(), error = %e, "INVITE session failed to handle response");
                }
                true
            }
            Method::Bye => true,
            _ => false,
        }
    }

    fn on_tsx_state(&self, _dialog: &Dialog, key: &TransactionKey, state: TransactionState) {
        let timed_out = key.method == Method::Invite
            && key.role == TransactionRole::Client
            && state == TransactionState::Terminated
            && self.inner.lock().state == InviteState::Calling;
        if timed_out {
            warn!(transaction = %key, "INVITE got no response");
            self.disconnect();
        }
    }
}

impl std::fmt::Debug for InviteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteSession")
            .field("dialog", &self.dialog)
            .finish_non_exhaustive()
    }
}
