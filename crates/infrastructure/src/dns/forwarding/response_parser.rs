use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::RData;

/// Conventional upper-case mnemonic of a response code (`NOERROR`, `NXDOMAIN`, ...).
pub fn response_code_name(code: ResponseCode) -> String {
    match code {
        ResponseCode::NoError => "NOERROR".to_string(),
        ResponseCode::FormErr => "FORMERR".to_string(),
        ResponseCode::ServFail => "SERVFAIL".to_string(),
        ResponseCode::NXDomain => "NXDOMAIN".to_string(),
        ResponseCode::NotImp => "NOTIMP".to_string(),
        ResponseCode::Refused => "REFUSED".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

/// Smallest TTL across the answer section, `None` when there are no answers.
pub fn min_answer_ttl(message: &Message) -> Option<u32> {
    message.answers().iter().map(|record| record.ttl()).min()
}

/// One-line rendering of the answer section for the query log, e.g.
/// `A (93.184.216.34), AAAA (::1)`. Falls back to the response code.
pub fn describe_answer(message: &Message) -> String {
    if message.answers().is_empty() {
        return response_code_name(message.response_code());
    }

    message
        .answers()
        .iter()
        .map(|record| match record.data() {
            Some(RData::A(a)) => format!("A ({})", a.0),
            Some(RData::AAAA(aaaa)) => format!("AAAA ({})", aaaa.0),
            Some(RData::CNAME(cname)) => format!("CNAME ({})", cname.0),
            Some(RData::PTR(ptr)) => format!("PTR ({})", ptr.0),
            Some(data) => format!("{} ({})", record.record_type(), data),
            None => record.record_type().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
