//! Media channel hook
//!
//! The session layer does not move RTP. After every successful offer/answer
//! exchange it hands the active SDP pair to a [`MediaChannel`], which
//! (re)configures the streams.

use sipneg_sip_core::sdp_prelude::SdpSession;

pub trait MediaChannel: Send + Sync {
    /// Apply a newly negotiated local/remote SDP pair
    ///
    /// Called with the dialog lock held; implementations must not block.
    fn update(&self, local: &SdpSession, remote: &SdpSession);
}

impl<F> MediaChannel for F
where
    F: Fn(&SdpSession, &SdpSession) + Send + Sync,
{
    fn update(&self, local: &SdpSession, remote: &SdpSession) {
        self(local, remote)
    }
}
