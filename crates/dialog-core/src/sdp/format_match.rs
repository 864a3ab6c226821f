//! Format matching
//!
//! Two formats match when they carry the same static payload type, or when
//! their rtpmap entries agree on encoding name, clock rate and channel
//! parameters. Codecs whose fmtp parameters matter for interoperability
//! (H.264 profiles, AMR modes) can add a [`FormatMatcher`] that is consulted
//! after the rtpmap comparison succeeds.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sipneg_sip_core::sdp::RtpMapAttribute;
use sipneg_sip_core::types::sdp::MediaDescription;

use crate::errors::{NegotiationError, NegotiationResult};

/// First dynamic RTP payload type
pub const DYNAMIC_PT_START: u32 = 96;

/// Additional codec-specific matching
///
/// Called with the offer and answer lines and the index of the format in
/// each. When `allow_modify_answer` is set the matcher may adjust the
/// answer's parameters (typically its fmtp) to fit the offer.
pub trait FormatMatcher: Send + Sync {
    fn match_format(
        &self,
        offer: &MediaDescription,
        offer_fmt_idx: usize,
        answer: &mut MediaDescription,
        answer_fmt_idx: usize,
        allow_modify_answer: bool,
    ) -> bool;
}

impl<F> FormatMatcher for F
where
    F: Fn(&MediaDescription, usize, &mut MediaDescription, usize, bool) -> bool + Send + Sync,
{
    fn match_format(
        &self,
        offer: &MediaDescription,
        offer_fmt_idx: usize,
        answer: &mut MediaDescription,
        answer_fmt_idx: usize,
        allow_modify_answer: bool,
    ) -> bool {
        self(offer, offer_fmt_idx, answer, answer_fmt_idx, allow_modify_answer)
    }
}

/// Format matchers keyed by encoding name, compared case-insensitively
#[derive(Clone, Default)]
pub struct FormatMatcherRegistry {
    matchers: HashMap<String, Arc<dyn FormatMatcher>>,
}

impl FormatMatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matcher for `encoding_name`, returning any matcher it replaces
    pub fn register(
        &mut self,
        encoding_name: &str,
        matcher: Arc<dyn FormatMatcher>,
    ) -> Option<Arc<dyn FormatMatcher>> {
        self.matchers.insert(encoding_name.to_ascii_lowercase(), matcher)
    }

    pub fn unregister(&mut self, encoding_name: &str) -> Option<Arc<dyn FormatMatcher>> {
        self.matchers.remove(&encoding_name.to_ascii_lowercase())
    }

    pub fn is_registered(&self, encoding_name: &str) -> bool {
        self.matchers.contains_key(&encoding_name.to_ascii_lowercase())
    }

    /// Run the matcher for `encoding_name`; formats without one match
    pub fn custom_match(
        &self,
        encoding_name: &str,
        offer: &MediaDescription,
        offer_fmt_idx: usize,
        answer: &mut MediaDescription,
        answer_fmt_idx: usize,
        allow_modify_answer: bool,
    ) -> bool {
        match self.matchers.get(&encoding_name.to_ascii_lowercase()) {
            Some(matcher) => matcher.match_format(
                offer,
                offer_fmt_idx,
                answer,
                answer_fmt_idx,
                allow_modify_answer,
            ),
            None => true,
        }
    }
}

impl fmt::Debug for FormatMatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.matchers.keys().collect();
        names.sort();
        f.debug_struct("FormatMatcherRegistry").field("matchers", &names).finish()
    }
}

/// Numeric payload type of a format token, if it is one
pub fn payload_type(fmt: &str) -> Option<u32> {
    fmt.parse().ok()
}

/// True for numeric dynamic payload types
pub fn is_dynamic(fmt: &str) -> bool {
    payload_type(fmt).is_some_and(|pt| pt >= DYNAMIC_PT_START)
}

/// Channel/parameter rule used when building an answer: equal, or one side
/// empty and the other `"1"`
pub(crate) fn params_match(a: &RtpMapAttribute, b: &RtpMapAttribute) -> bool {
    let (pa, pb) = (a.param(), b.param());
    pa.eq_ignore_ascii_case(pb) || (pa.is_empty() && pb == "1") || (pb.is_empty() && pa == "1")
}

/// Encoding name, clock rate and parameters agree
pub(crate) fn rtpmap_compatible(a: &RtpMapAttribute, b: &RtpMapAttribute) -> bool {
    a.encoding_name.eq_ignore_ascii_case(&b.encoding_name)
        && a.clock_rate == b.clock_rate
        && params_match(a, b)
}

pub(crate) fn rtpmap_for(m: &MediaDescription, fmt: &str) -> NegotiationResult<RtpMapAttribute> {
    m.rtpmap(fmt).ok_or_else(|| {
        NegotiationError::InvalidSdp(format!("no rtpmap for payload type {} in {} media", fmt, m.media))
    })
}

/// Compare format `offer_fmt_idx` of `offer` with `answer_fmt_idx` of `answer`
///
/// Static payload types match by number. Dynamic ones must have rtpmap
/// entries that agree, after which any registered [`FormatMatcher`] for the
/// encoding decides. A dynamic format without rtpmap is an
/// [`NegotiationError::InvalidSdp`].
pub fn fmt_match(
    registry: &FormatMatcherRegistry,
    offer: &MediaDescription,
    offer_fmt_idx: usize,
    answer: &mut MediaDescription,
    answer_fmt_idx: usize,
    allow_modify_answer: bool,
) -> NegotiationResult<bool> {
    let (Some(o_fmt), Some(a_fmt)) = (
        offer.formats.get(offer_fmt_idx),
        answer.formats.get(answer_fmt_idx),
    ) else {
        return Ok(false);
    };

    if !is_dynamic(o_fmt) || !is_dynamic(a_fmt) {
        return Ok(o_fmt == a_fmt);
    }

    let o_rtpmap = rtpmap_for(offer, o_fmt)?;
    let a_rtpmap = rtpmap_for(answer, a_fmt)?;
    if !rtpmap_compatible(&o_rtpmap, &a_rtpmap) {
        return Ok(false);
    }

    Ok(registry.custom_match(
        &o_rtpmap.encoding_name,
        offer,
        offer_fmt_idx,
        answer,
        answer_fmt_idx,
        allow_modify_answer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sipneg_sip_core::types::sdp::SdpAttribute;

    fn video(fmt: &str, rtpmap: &str, fmtp: &str) -> MediaDescription {
        MediaDescription::new("video", 5000, "RTP/AVP", vec![fmt.to_string()])
            .with_attribute(SdpAttribute::value("rtpmap", rtpmap))
            .with_attribute(SdpAttribute::value("fmtp", fmtp))
    }

    fn packetization_mode(m: &MediaDescription, fmt: &str) -> Option<String> {
        m.fmtp(fmt)?
            .params
            .split(';')
            .map(str::trim)
            .find_map(|p| p.strip_prefix("packetization-mode=").map(str::to_string))
    }

    #[test]
    fn test_static_payload_types_match_by_number() {
        let registry = FormatMatcherRegistry::new();
        let offer = MediaDescription::new("audio", 4000, "RTP/AVP", vec!["0".into(), "8".into()]);
        let mut answer = MediaDescription::new("audio", 5000, "RTP/AVP", vec!["8".into()]);
        assert!(!fmt_match(&registry, &offer, 0, &mut answer, 0, false).unwrap());
        assert!(fmt_match(&registry, &offer, 1, &mut answer, 0, false).unwrap());
    }

    #[test]
    fn test_dynamic_payload_types_match_by_rtpmap() {
        let registry = FormatMatcherRegistry::new();
        let offer = video("97", "97 H264/90000", "97 packetization-mode=1");
        let mut answer = video("99", "99 h264/90000", "99 packetization-mode=0");
        assert!(fmt_match(&registry, &offer, 0, &mut answer, 0, false).unwrap());

        let mut other_clock = video("99", "99 H264/45000", "99 packetization-mode=1");
        assert!(!fmt_match(&registry, &offer, 0, &mut other_clock, 0, false).unwrap());
    }

    #[test]
    fn test_custom_matcher_is_consulted() {
        let mut registry = FormatMatcherRegistry::new();
        registry.register(
            "H264",
            Arc::new(
                |offer: &MediaDescription, oi: usize, answer: &mut MediaDescription, ai: usize, _: bool| {
                    packetization_mode(offer, &offer.formats[oi])
                        == packetization_mode(answer, &answer.formats[ai])
                },
            ),
        );
        assert!(registry.is_registered("h264"));

        let offer = video("97", "97 H264/90000", "97 packetization-mode=1");
        let mut same = video("99", "99 H264/90000", "99 packetization-mode=1");
        let mut different = video("99", "99 H264/90000", "99 packetization-mode=0");
        assert!(fmt_match(&registry, &offer, 0, &mut same, 0, false).unwrap());
        assert!(!fmt_match(&registry, &offer, 0, &mut different, 0, false).unwrap());

        assert!(registry.unregister("H264").is_some());
        assert!(fmt_match(&registry, &offer, 0, &mut different, 0, false).unwrap());
    }

    #[test]
    fn test_missing_rtpmap_is_an_error() {
        let registry = FormatMatcherRegistry::new();
        let offer = MediaDescription::new("audio", 4000, "RTP/AVP", vec!["96".into()]);
        let mut answer = video("96", "96 opus/48000", "96 x=1");
        assert!(fmt_match(&registry, &offer, 0, &mut answer, 0, false).is_err());
    }

    #[test]
    fn test_channel_param_defaults_to_one() {
        let a: RtpMapAttribute = "96 L16/8000".parse().unwrap();
        let b: RtpMapAttribute = "97 L16/8000/1".parse().unwrap();
        let c: RtpMapAttribute = "98 L16/8000/2".parse().unwrap();
        assert!(rtpmap_compatible(&a, &b));
        assert!(!rtpmap_compatible(&a, &c));
    }
}
