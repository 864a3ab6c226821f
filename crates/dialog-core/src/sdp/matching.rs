//! Media line matching for offer/answer
//!
//! Two directions are handled here:
//!
//! - **Answer processing**: a received answer is applied to our offer,
//!   narrowing the formats of each offered line to what the peer accepted and
//!   mirroring its direction ([`process_answer`]).
//! - **Answer creation**: a received offer is matched against our capability
//!   to build the answer we send ([`create_answer`]).
//!
//! Both follow RFC 3264: lines are paired by index, a zero port rejects a
//! line and the answer always carries exactly as many lines as the offer.

use sipneg_sip_core::sdp_prelude::*;
use tracing::{debug, trace};

use super::format_match::{
    is_dynamic, params_match, payload_type, rtpmap_for, FormatMatcherRegistry, DYNAMIC_PT_START,
};
use crate::errors::{NegotiationError, NegotiationResult};

/// Options that shape the answer built from our capability
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub prefer_remote_codec_order: bool,
    pub answer_with_multiple_codecs: bool,
}

/// Clock rate assumed for static payload types
const STATIC_PT_CLOCK_RATE: u32 = 8000;

/// Reconcile `local`'s direction with the direction `remote` declared
///
/// Attributes are only rewritten when the resulting direction differs.
pub fn update_media_direction(remote: &MediaDescription, local: &mut MediaDescription) {
    let old = local.direction();

    let new = if remote.has_attribute(MediaDirection::Inactive.as_str()) {
        MediaDirection::Inactive
    } else if remote.has_attribute(MediaDirection::SendOnly.as_str()) {
        match old {
            MediaDirection::SendRecv | MediaDirection::RecvOnly => MediaDirection::RecvOnly,
            _ => MediaDirection::Inactive,
        }
    } else if remote.has_attribute(MediaDirection::RecvOnly.as_str()) {
        match old {
            MediaDirection::SendRecv | MediaDirection::SendOnly => MediaDirection::SendOnly,
            _ => MediaDirection::Inactive,
        }
    } else {
        old
    };

    if new != old {
        trace!("{} media direction {} -> {}", local.media, old, new);
        local.set_direction(new);
    }
}

/// A rejected copy of `remote` that still carries a usable connection line
pub fn clone_deactivate(
    remote: &MediaDescription,
    local_media: &MediaDescription,
    local_session: &SdpSession,
) -> MediaDescription {
    let mut m = remote.deactivated_clone();
    if m.connection.is_none() && local_session.connection.is_none() {
        m.connection = Some(
            local_media
                .connection
                .clone()
                .unwrap_or_else(|| ConnectionData::ipv4("127.0.0.1")),
        );
    }
    m
}

fn remove_format_attributes(m: &mut MediaDescription, fmt: &str) {
    m.remove_attribute_for_format("rtpmap", fmt);
    m.remove_attribute_for_format("fmtp", fmt);
}

/// Apply one answered line to the corresponding offered line
///
/// On success `offer` holds the formats both sides agreed on, ordered by the
/// answer's preference, and `answer` has lost any format we did not offer.
pub fn process_m_answer(
    registry: &FormatMatcherRegistry,
    offer: &mut MediaDescription,
    answer: &mut MediaDescription,
    allow_asymmetric: bool,
) -> NegotiationResult<()> {
    if offer.media != answer.media {
        return Err(NegotiationError::InvalidAnswerMediaType);
    }

    // Rejected by the peer
    if !answer.is_active() {
        offer.deactivate();
        return Ok(());
    }

    if !transport_compare(&offer.protocol, &answer.protocol) {
        return Err(NegotiationError::InvalidAnswerTransport);
    }

    // We rejected it ourselves
    if !offer.is_active() {
        return Ok(());
    }

    update_media_direction(answer, offer);

    if allow_asymmetric {
        return if answer.formats.iter().any(|f| offer.formats.contains(f)) {
            Ok(())
        } else {
            Err(NegotiationError::NoCommonMedia)
        };
    }

    // prior[i] is the answer index that accepted offer format i
    let mut prior: Vec<usize> = Vec::with_capacity(offer.formats.len());
    let mut i = 0;
    while i < offer.formats.len() {
        let fmt = offer.formats[i].clone();

        let found = if is_dynamic(&fmt) {
            let or = rtpmap_for(offer, &fmt)?;
            let mut found = None;
            for j in 0..answer.formats.len() {
                let Some(ar) = answer.rtpmap(&answer.formats[j]) else {
                    continue;
                };
                if or.encoding_name.eq_ignore_ascii_case(&ar.encoding_name)
                    && or.clock_rate == ar.clock_rate
                    && params_match(&or, &ar)
                    && registry.custom_match(&or.encoding_name, offer, i, answer, j, false)
                {
                    found = Some(j);
                    break;
                }
            }
            found
        } else {
            answer.formats.iter().position(|a| *a == fmt)
        };

        match found {
            Some(j) => {
                prior.push(j);
                i += 1;
            }
            None => {
                trace!("dropping unanswered format {} from {} offer", fmt, offer.media);
                offer.formats.remove(i);
                remove_format_attributes(offer, &fmt);
            }
        }
    }

    if offer.formats.is_empty() {
        return Err(NegotiationError::NoCommonMedia);
    }

    // Order the offer by the answer's preference
    let n = offer.formats.len();
    for i in 0..n {
        for j in i + 1..n {
            if prior[i] > prior[j] {
                prior.swap(i, j);
                offer.formats.swap(i, j);
            }
        }
    }

    // Drop answer formats that were not part of the offer
    let mut removed = 0;
    let mut i = 0;
    while i < answer.formats.len() {
        let keep = i < n && prior[i].checked_sub(removed) == Some(i);
        if keep {
            i += 1;
        } else {
            let fmt = answer.formats.remove(i);
            remove_format_attributes(answer, &fmt);
            removed += 1;
        }
    }

    Ok(())
}

/// Apply a received answer to our offer
///
/// Returns the offer narrowed to the negotiated media, which becomes the
/// active local SDP, together with the answer padded to the offer's line
/// count.
pub fn process_answer(
    registry: &FormatMatcherRegistry,
    local_offer: &SdpSession,
    answer: &SdpSession,
    allow_asymmetric: bool,
) -> NegotiationResult<(SdpSession, SdpSession)> {
    let mut offer = local_offer.clone();
    let mut answer = answer.clone();
    let mut has_active = false;
    let mut ami = 0;

    for omi in 0..offer.media.len() {
        if ami == answer.media.len() {
            // Answer is shorter than the offer
            let rejected = clone_deactivate(&offer.media[omi], &offer.media[omi], &offer);
            answer.media.push(rejected);
            offer.media[omi].deactivate();
            ami += 1;
            continue;
        }

        match process_m_answer(registry, &mut offer.media[omi], &mut answer.media[ami], allow_asymmetric) {
            Ok(()) => {}
            Err(NegotiationError::InvalidAnswerMediaType) => {
                debug!(
                    "answer line {} is {} but {} was offered, disabling it",
                    ami, answer.media[ami].media, offer.media[omi].media
                );
                offer.media[omi].deactivate();
                ami += 1;
                continue;
            }
            Err(NegotiationError::NoCommonMedia) => {
                debug!("no common format for {} line {}", offer.media[omi].media, omi);
                offer.media[omi].deactivate();
                answer.media[ami].deactivate();
            }
            Err(e) => return Err(e),
        }

        if offer.media[omi].is_active() {
            has_active = true;
        }
        ami += 1;
    }

    if has_active {
        Ok((offer, answer))
    } else {
        Err(NegotiationError::NoActiveMedia)
    }
}

/// Replace the leading payload type token of an rtpmap or fmtp value
fn rewrite_pt(attr: &mut SdpAttribute, old_pt: &str, new_pt: &str) {
    if let Some(value) = attr.value.as_mut() {
        if let Some(rest) = value.strip_prefix(old_pt) {
            *value = format!("{}{}", new_pt, rest);
        }
    }
}

/// Renumber answer formats to the payload types the offer used for them
///
/// Rewritten rtpmap/fmtp entries are moved to the end of the attribute list
/// so a renumbered format cannot shadow another that used the same number.
fn apply_symmetric_pt(answer: &mut MediaDescription, pt_offer: &[String], pt_answer: &[String]) {
    let mut moved = Vec::new();

    for (i, (offered, answered)) in pt_offer.iter().zip(pt_answer).enumerate() {
        if offered == answered {
            continue;
        }
        answer.formats[i] = offered.clone();
        for name in ["rtpmap", "fmtp"] {
            if let Some(mut attr) = answer.remove_attribute_for_format(name, answered) {
                rewrite_pt(&mut attr, answered, offered);
                moved.push(attr);
            }
        }
    }

    answer.attributes.extend(moved);
}

/// Snapshot of one format token and its rtpmap
struct FormatInfo {
    fmt: String,
    rtpmap: Option<RtpMapAttribute>,
}

fn format_infos(m: &MediaDescription) -> Vec<FormatInfo> {
    m.formats
        .iter()
        .map(|fmt| FormatInfo {
            fmt: fmt.clone(),
            rtpmap: m.rtpmap(fmt),
        })
        .collect()
}

/// Record a negotiated pair unless either side is already listed
fn push_pair(pt_offer: &mut Vec<String>, pt_answer: &mut Vec<String>, offered: &str, answered: &str) {
    if !pt_offer.iter().any(|p| p == offered) && !pt_answer.iter().any(|p| p == answered) {
        pt_offer.push(offered.to_string());
        pt_answer.push(answered.to_string());
    }
}

fn starts_with_digit(fmt: &str) -> bool {
    fmt.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Build our answer for one offered line from one capability line
pub fn match_offer(
    registry: &FormatMatcherRegistry,
    options: MatchOptions,
    offer: &MediaDescription,
    preanswer: &MediaDescription,
    preanswer_sdp: &SdpSession,
) -> NegotiationResult<MediaDescription> {
    if !offer.is_active() {
        return Ok(clone_deactivate(offer, preanswer, preanswer_sdp));
    }
    if !preanswer.is_active() {
        return Ok(preanswer.clone());
    }

    let prefer = options.prefer_remote_codec_order;
    let multiple = options.answer_with_multiple_codecs;

    let offer_infos = format_infos(offer);
    let preanswer_infos = format_infos(preanswer);
    let (master, slave) = if prefer {
        (&offer_infos, &preanswer_infos)
    } else {
        (&preanswer_infos, &offer_infos)
    };

    // Custom matchers may adjust our fmtp while matching
    let mut preanswer = preanswer.clone();

    let mut master_has_codec = false;
    let mut master_has_other = false;
    let mut found_codec = false;
    let mut found_tel = false;
    let mut found_other = false;
    let mut pt_offer: Vec<String> = Vec::new();
    let mut pt_answer: Vec<String> = Vec::new();
    let mut codec_clock_rates: Vec<u32> = Vec::new();
    let mut tel_clock_rates: Vec<u32> = Vec::new();

    for (i, m) in master.iter().enumerate() {
        if !starts_with_digit(&m.fmt) {
            // Non-RTP formats such as "x-ms-message" or "*"
            master_has_other = true;
            if found_other {
                continue;
            }
            if let Some(j) = slave.iter().position(|s| s.fmt == m.fmt) {
                found_other = true;
                let (o, a) = if prefer { (i, j) } else { (j, i) };
                push_pair(&mut pt_offer, &mut pt_answer, &offer_infos[o].fmt, &preanswer_infos[a].fmt);
            }
            continue;
        }

        let pt = payload_type(&m.fmt).unwrap_or(u32::MAX);
        if pt < DYNAMIC_PT_START {
            master_has_codec = true;
            if !multiple && found_codec {
                continue;
            }
            let matched = slave
                .iter()
                .find(|s| starts_with_digit(&s.fmt) && payload_type(&s.fmt) == Some(pt));
            if let Some(s) = matched {
                found_codec = true;
                push_pair(&mut pt_offer, &mut pt_answer, &s.fmt, &s.fmt);
                if !codec_clock_rates.contains(&STATIC_PT_CLOCK_RATE) {
                    codec_clock_rates.push(STATIC_PT_CLOCK_RATE);
                }
            }
            continue;
        }

        let Some(mr) = m.rtpmap.as_ref() else {
            return Err(NegotiationError::InvalidSdp(format!(
                "no rtpmap for payload type {}",
                m.fmt
            )));
        };

        let is_codec = !mr.is_telephone_event();
        if is_codec {
            master_has_codec = true;
            if !multiple && found_codec {
                continue;
            }
        }

        for (j, s) in slave.iter().enumerate() {
            let Some(sr) = s.rtpmap.as_ref() else {
                continue;
            };
            if !(mr.encoding_name.eq_ignore_ascii_case(&sr.encoding_name)
                && mr.clock_rate == sr.clock_rate
                && params_match(mr, sr))
            {
                continue;
            }

            let (o, a) = if prefer { (i, j) } else { (j, i) };

            if is_codec {
                if !registry.custom_match(&mr.encoding_name, offer, o, &mut preanswer, a, true) {
                    continue;
                }
                found_codec = true;
                if !codec_clock_rates.contains(&mr.clock_rate) {
                    codec_clock_rates.push(mr.clock_rate);
                }
            } else {
                if tel_clock_rates.contains(&mr.clock_rate) {
                    continue;
                }
                tel_clock_rates.push(mr.clock_rate);
                found_tel = true;
            }

            push_pair(&mut pt_offer, &mut pt_answer, &offer_infos[o].fmt, &preanswer_infos[a].fmt);
            break;
        }
    }

    if master_has_codec && !found_codec {
        return Err(NegotiationError::NoAnswerCodec);
    }
    if master_has_other && !found_other {
        return Err(NegotiationError::NoAnswerUnknownFormat);
    }

    if found_tel {
        prune_telephone_events(&preanswer, &codec_clock_rates, &mut pt_offer, &mut pt_answer);
    }

    // Answer formats in negotiated order, unused ones dropped
    let mut answer = preanswer;
    let count = pt_answer.len();
    for (i, wanted) in pt_answer.iter().enumerate() {
        if let Some(j) = answer.formats.iter().skip(i).position(|f| f == wanted) {
            answer.formats.swap(i, i + j);
        }
    }
    let unused: Vec<String> = answer.formats.drain(count.min(answer.formats.len())..).collect();
    for fmt in &unused {
        remove_format_attributes(&mut answer, fmt);
    }

    apply_symmetric_pt(&mut answer, &pt_offer, &pt_answer);
    update_media_direction(offer, &mut answer);

    Ok(answer)
}

/// Keep only telephone-events whose clock rate matches a chosen codec
fn prune_telephone_events(
    preanswer: &MediaDescription,
    codec_clock_rates: &[u32],
    pt_offer: &mut Vec<String>,
    pt_answer: &mut Vec<String>,
) {
    let mut first: Option<(String, String)> = None;
    let mut matched = 0;
    let mut i = 0;

    while i < pt_answer.len() {
        if !is_dynamic(&pt_answer[i]) {
            i += 1;
            continue;
        }
        let Some(r) = preanswer.rtpmap(&pt_answer[i]) else {
            i += 1;
            continue;
        };
        if !r.is_telephone_event() {
            i += 1;
            continue;
        }

        if first.is_none() {
            first = Some((pt_offer[i].clone(), pt_answer[i].clone()));
        }

        if codec_clock_rates.contains(&r.clock_rate) {
            matched += 1;
            i += 1;
        } else {
            trace!("dropping telephone-event/{} with no matching codec", r.clock_rate);
            pt_offer.remove(i);
            pt_answer.remove(i);
        }
    }

    if matched == 0 {
        if let Some((o, a)) = first {
            pt_offer.push(o);
            pt_answer.push(a);
        }
    }
}

fn same_transport(a: &str, b: &str) -> bool {
    let (a, b) = (trim_rtcp_fb(a), trim_rtcp_fb(b));
    match (TransportProto::from_protocol(a), TransportProto::from_protocol(b)) {
        (TransportProto::Unknown, TransportProto::Unknown) => a.eq_ignore_ascii_case(b),
        (pa, pb) => pa == pb,
    }
}

/// Build a complete answer to `offer` from our capability `initial`
///
/// Each offered line is paired with the first unused capability line of the
/// same media type and transport that it can be matched with. Lines without
/// a partner are answered with a rejected copy of the offered line.
pub fn create_answer(
    registry: &FormatMatcherRegistry,
    options: MatchOptions,
    initial: &SdpSession,
    offer: &SdpSession,
) -> NegotiationResult<SdpSession> {
    let mut answer = initial.clone();
    answer.media.clear();

    let mut used = vec![false; initial.media.len()];
    let mut status = NegotiationError::NoActiveMedia;
    let mut has_active = false;

    for om in &offer.media {
        let mut matched = None;

        for (j, im) in initial.media.iter().enumerate() {
            if used[j] || im.media != om.media || !same_transport(&im.protocol, &om.protocol) {
                continue;
            }
            match match_offer(registry, options, om, im, initial) {
                Ok(am) => {
                    used[j] = true;
                    matched = Some(am);
                    break;
                }
                Err(e) => {
                    debug!("{} line {} does not match offer: {}", im.media, j, e);
                    status = e;
                }
            }
        }

        let am = matched.unwrap_or_else(|| clone_deactivate(om, om, &answer));
        if am.is_active() {
            has_active = true;
        }
        answer.media.push(am);
    }

    if has_active {
        Ok(answer)
    } else {
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sdp(text: &str) -> SdpSession {
        SdpSession::from_str(&text.replace('\n', "\r\n")).unwrap()
    }

    fn audio(port: u16, fmts: &[&str]) -> MediaDescription {
        MediaDescription::new("audio", port, "RTP/AVP", fmts.iter().map(|f| f.to_string()).collect())
    }

    fn options(prefer_remote: bool, multiple: bool) -> MatchOptions {
        MatchOptions {
            prefer_remote_codec_order: prefer_remote,
            answer_with_multiple_codecs: multiple,
        }
    }

    #[test]
    fn test_direction_reconciliation() {
        let cases = [
            (MediaDirection::SendRecv, MediaDirection::SendOnly, MediaDirection::RecvOnly),
            (MediaDirection::SendRecv, MediaDirection::RecvOnly, MediaDirection::SendOnly),
            (MediaDirection::SendRecv, MediaDirection::Inactive, MediaDirection::Inactive),
            (MediaDirection::SendOnly, MediaDirection::SendOnly, MediaDirection::Inactive),
            (MediaDirection::RecvOnly, MediaDirection::RecvOnly, MediaDirection::Inactive),
            (MediaDirection::SendOnly, MediaDirection::RecvOnly, MediaDirection::SendOnly),
            (MediaDirection::RecvOnly, MediaDirection::SendRecv, MediaDirection::RecvOnly),
        ];
        for (local_dir, remote_dir, expected) in cases {
            let mut local = audio(4000, &["0"]);
            local.set_direction(local_dir);
            let mut remote = audio(5000, &["0"]);
            remote.set_direction(remote_dir);
            update_media_direction(&remote, &mut local);
            assert_eq!(local.direction(), expected, "{} vs {}", local_dir, remote_dir);
        }
    }

    #[test]
    fn test_unchanged_direction_keeps_attributes() {
        let mut local = audio(4000, &["0"])
            .with_attribute(SdpAttribute::property("recvonly"))
            .with_attribute(SdpAttribute::value("ptime", "20"));
        let mut remote = audio(5000, &["0"]);
        remote.set_direction(MediaDirection::SendOnly);
        update_media_direction(&remote, &mut local);
        assert_eq!(local.attributes[0].name, "recvonly");
        assert_eq!(local.attributes[1].name, "ptime");
    }

    #[test]
    fn test_clone_deactivate_adds_connection() {
        let offer = audio(4000, &["0"]).with_attribute(SdpAttribute::property("sendonly"));
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.1"), "-");
        let rejected = clone_deactivate(&offer, &offer, &session);
        assert_eq!(rejected.port, 0);
        assert!(rejected.attributes.is_empty());
        assert_eq!(rejected.formats, vec!["0"]);
        assert_eq!(rejected.connection.unwrap().address, "127.0.0.1");
    }

    #[test]
    fn test_process_m_answer_narrows_and_orders_offer() {
        let registry = FormatMatcherRegistry::new();
        let mut offer = audio(4000, &["0", "8", "97"])
            .with_attribute(SdpAttribute::value("rtpmap", "97 speex/8000"))
            .with_attribute(SdpAttribute::value("fmtp", "97 mode=4"));
        let mut answer = audio(5000, &["8", "0", "18"]);

        process_m_answer(&registry, &mut offer, &mut answer, false).unwrap();
        assert_eq!(offer.formats, vec!["8", "0"]);
        assert!(offer.rtpmap("97").is_none());
        assert!(offer.fmtp("97").is_none());
        assert_eq!(answer.formats, vec!["8", "0"]);
    }

    #[test]
    fn test_process_m_answer_rejection_and_mismatch() {
        let registry = FormatMatcherRegistry::new();

        let mut offer = audio(4000, &["0"]);
        let mut rejected = MediaDescription::new("audio", 0, "RTP/SAVP", vec!["0".into()]);
        process_m_answer(&registry, &mut offer, &mut rejected, false).unwrap();
        assert!(!offer.is_active());

        let mut offer = audio(4000, &["0"]);
        let mut video = MediaDescription::new("video", 5000, "RTP/AVP", vec!["31".into()]);
        assert_eq!(
            process_m_answer(&registry, &mut offer, &mut video, false),
            Err(NegotiationError::InvalidAnswerMediaType)
        );

        let mut srtp = MediaDescription::new("audio", 5000, "RTP/SAVP", vec!["0".into()]);
        assert_eq!(
            process_m_answer(&registry, &mut offer, &mut srtp, false),
            Err(NegotiationError::InvalidAnswerTransport)
        );

        let mut none = audio(5000, &["18"]);
        assert_eq!(
            process_m_answer(&registry, &mut offer, &mut none, false),
            Err(NegotiationError::NoCommonMedia)
        );
    }

    #[test]
    fn test_process_m_answer_treats_one_channel_as_default() {
        let registry = FormatMatcherRegistry::new();
        for (offered, answered) in [("96 L16/8000/1", "97 L16/8000"), ("96 L16/8000", "97 L16/8000/1")] {
            let mut offer = audio(4000, &["96"]).with_attribute(SdpAttribute::value("rtpmap", offered));
            let mut answer = audio(5000, &["97"]).with_attribute(SdpAttribute::value("rtpmap", answered));
            process_m_answer(&registry, &mut offer, &mut answer, false).unwrap();
            assert_eq!(offer.formats, vec!["96"]);
            assert_eq!(answer.formats, vec!["97"]);
        }

        let mut offer = audio(4000, &["96"]).with_attribute(SdpAttribute::value("rtpmap", "96 L16/8000/2"));
        let mut answer = audio(5000, &["97"]).with_attribute(SdpAttribute::value("rtpmap", "97 L16/8000"));
        assert_eq!(
            process_m_answer(&registry, &mut offer, &mut answer, false),
            Err(NegotiationError::NoCommonMedia)
        );
    }

    #[test]
    fn test_process_m_answer_asymmetric_keeps_formats() {
        let registry = FormatMatcherRegistry::new();
        let mut offer = audio(4000, &["0", "8"]);
        let mut answer = audio(5000, &["8", "3"]);
        process_m_answer(&registry, &mut offer, &mut answer, true).unwrap();
        assert_eq!(offer.formats, vec!["0", "8"]);
        assert_eq!(answer.formats, vec!["8", "3"]);
    }

    #[test]
    fn test_process_answer_pads_short_answer() {
        let registry = FormatMatcherRegistry::new();
        let offer = sdp("v=0
o=alice 1 1 IN IP4 10.0.0.1
s=-
c=IN IP4 10.0.0.1
t=0 0
m=audio 4000 RTP/AVP 0
m=video 4002 RTP/AVP 31
");
        let answer = sdp("v=0
o=bob 2 2 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 5000 RTP/AVP 0
");
        let (active_local, active_remote) = process_answer(&registry, &offer, &answer, false).unwrap();
        assert_eq!(active_local.media.len(), 2);
        assert_eq!(active_remote.media.len(), 2);
        assert!(active_local.media[0].is_active());
        assert!(!active_local.media[1].is_active());
        assert!(!active_remote.media[1].is_active());
        assert_eq!(active_remote.media[1].media, "video");
    }

    #[test]
    fn test_process_answer_without_active_media() {
        let registry = FormatMatcherRegistry::new();
        let offer = sdp("v=0
o=alice 1 1 IN IP4 10.0.0.1
s=-
c=IN IP4 10.0.0.1
t=0 0
m=audio 4000 RTP/AVP 0
");
        let answer = sdp("v=0
o=bob 2 2 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 5000 RTP/AVP 8
");
        assert_eq!(
            process_answer(&registry, &offer, &answer, false),
            Err(NegotiationError::NoActiveMedia)
        );
    }

    #[test]
    fn test_match_offer_single_codec() {
        let registry = FormatMatcherRegistry::new();
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.2"), "-");
        let offer = audio(4000, &["0", "8", "18"]);
        let capability = audio(5000, &["18", "8"]);

        let answer = match_offer(&registry, options(true, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer.formats, vec!["8"]);

        let answer = match_offer(&registry, options(false, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer.formats, vec!["18"]);

        let answer = match_offer(&registry, options(true, true), &offer, &capability, &session).unwrap();
        assert_eq!(answer.formats, vec!["8", "18"]);
    }

    #[test]
    fn test_match_offer_symmetric_payload_types() {
        let registry = FormatMatcherRegistry::new();
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.2"), "-");
        let offer = audio(4000, &["97", "101"])
            .with_attribute(SdpAttribute::value("rtpmap", "97 opus/48000/2"))
            .with_attribute(SdpAttribute::value("rtpmap", "101 telephone-event/48000"));
        let capability = audio(5000, &["111", "96", "0"])
            .with_attribute(SdpAttribute::value("rtpmap", "111 opus/48000/2"))
            .with_attribute(SdpAttribute::value("fmtp", "111 useinbandfec=1"))
            .with_attribute(SdpAttribute::value("rtpmap", "96 telephone-event/48000"))
            .with_attribute(SdpAttribute::value("fmtp", "96 0-15"));

        let answer = match_offer(&registry, options(true, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer.formats, vec!["97", "101"]);
        assert_eq!(answer.rtpmap("97").unwrap().encoding_name, "opus");
        assert_eq!(answer.fmtp("97").unwrap().params, "useinbandfec=1");
        assert!(answer.rtpmap("101").unwrap().is_telephone_event());
        assert!(answer.rtpmap("111").is_none());
    }

    #[test]
    fn test_match_offer_prunes_telephone_event_clock_rates() {
        let registry = FormatMatcherRegistry::new();
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.2"), "-");
        let offer = audio(4000, &["0", "101", "102"])
            .with_attribute(SdpAttribute::value("rtpmap", "101 telephone-event/8000"))
            .with_attribute(SdpAttribute::value("rtpmap", "102 telephone-event/16000"));
        let capability = audio(5000, &["0", "101", "102"])
            .with_attribute(SdpAttribute::value("rtpmap", "101 telephone-event/8000"))
            .with_attribute(SdpAttribute::value("rtpmap", "102 telephone-event/16000"));

        let answer = match_offer(&registry, options(true, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer.formats, vec!["0", "101"]);
        assert!(answer.rtpmap("102").is_none());
    }

    #[test]
    fn test_match_offer_keeps_first_telephone_event_without_clock_match() {
        let registry = FormatMatcherRegistry::new();
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.2"), "-");
        let offer = audio(4000, &["0", "102"])
            .with_attribute(SdpAttribute::value("rtpmap", "102 telephone-event/16000"));
        let capability = audio(5000, &["0", "102"])
            .with_attribute(SdpAttribute::value("rtpmap", "102 telephone-event/16000"));

        let answer = match_offer(&registry, options(true, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer.formats, vec!["0", "102"]);
    }

    #[test]
    fn test_match_offer_errors() {
        let registry = FormatMatcherRegistry::new();
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.2"), "-");

        let offer = audio(4000, &["0"]);
        let capability = audio(5000, &["8"]);
        assert_eq!(
            match_offer(&registry, options(true, false), &offer, &capability, &session),
            Err(NegotiationError::NoAnswerCodec)
        );

        let offer = MediaDescription::new("x-ms-message", 5060, "sip", vec!["null".into()]);
        let capability = MediaDescription::new("x-ms-message", 5060, "sip", vec!["other".into()]);
        assert_eq!(
            match_offer(&registry, options(true, false), &offer, &capability, &session),
            Err(NegotiationError::NoAnswerUnknownFormat)
        );
    }

    #[test]
    fn test_match_offer_propagates_port_zero() {
        let registry = FormatMatcherRegistry::new();
        let session = SdpSession::new(Origin::new("-", 1, 1, "10.0.0.2"), "-");
        let offer = audio(0, &["0"]);
        let capability = audio(5000, &["0"]).with_connection(ConnectionData::ipv4("10.0.0.2"));
        let answer = match_offer(&registry, options(true, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer.port, 0);
        assert_eq!(answer.connection.unwrap().address, "10.0.0.2");

        let offer = audio(4000, &["0"]);
        let capability = audio(0, &["0"]);
        let answer = match_offer(&registry, options(true, false), &offer, &capability, &session).unwrap();
        assert_eq!(answer, capability);
    }

    #[test]
    fn test_create_answer_pairs_lines_by_type_and_transport() {
        let registry = FormatMatcherRegistry::new();
        let capability = sdp("v=0
o=bob 2 2 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=video 5002 RTP/AVP 31
m=audio 5000 RTP/AVP 0 8
");
        let offer = sdp("v=0
o=alice 1 1 IN IP4 10.0.0.1
s=-
c=IN IP4 10.0.0.1
t=0 0
m=audio 4000 RTP/AVPF 8
m=audio 4002 RTP/AVP 0
m=video 4004 RTP/AVP 31
");
        let answer = create_answer(&registry, options(true, false), &capability, &offer).unwrap();
        assert_eq!(answer.media.len(), 3);
        assert_eq!(answer.media[0].formats, vec!["8"]);
        assert_eq!(answer.media[0].port, 5000);
        assert!(!answer.media[1].is_active());
        assert_eq!(answer.media[2].media, "video");
        assert!(answer.media[2].is_active());
        assert_eq!(answer.origin, capability.origin);
    }

    #[test]
    fn test_create_answer_reports_last_error() {
        let registry = FormatMatcherRegistry::new();
        let capability = sdp("v=0
o=bob 2 2 IN IP4 10.0.0.2
s=-
c=IN IP4 10.0.0.2
t=0 0
m=audio 5000 RTP/AVP 8
");
        let offer = sdp("v=0
o=alice 1 1 IN IP4 10.0.0.1
s=-
c=IN IP4 10.0.0.1
t=0 0
m=audio 4000 RTP/AVP 0
");
        assert_eq!(
            create_answer(&registry, options(true, false), &capability, &offer),
            Err(NegotiationError::NoAnswerCodec)
        );
    }
}
