use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{Name, RData, Record, RecordType as HickoryRecordType};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use steer_dns_application::use_cases::RewriteRules;
use steer_dns_domain::{AddressFamily, CandidatePool, IpRangeSet};

pub const CDN_IPV4: &[&str] = &["1.1.1.0/24", "104.16.0.0/12"];
pub const CDN_IPV6: &[&str] = &["2606:4700::/32"];
pub const CANDIDATES_IPV4: &[&str] = &["162.159.1.1", "162.159.1.2", "162.159.1.3", "162.159.1.4"];
pub const CANDIDATES_IPV6: &[&str] = &["2606:4700:a::1", "2606:4700:a::2", "2606:4700:a::3"];

pub fn build_query(id: u16, domain: &str, query_type: HickoryRecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(domain).unwrap(), query_type));
    message
}

/// Upstream-style response to `query` carrying `answers`.
pub fn build_response(query: &Message, answers: Vec<Record>) -> Message {
    let mut message = Message::new();
    message
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .set_response_code(ResponseCode::NoError);
    message.add_queries(query.queries().iter().cloned());
    message.insert_answers(answers);
    message
}

pub fn address_record(owner: &str, ip: &str, ttl: u32) -> Record {
    let name = Name::from_str(owner).unwrap();
    let rdata = match ip.parse::<IpAddr>().unwrap() {
        IpAddr::V4(v4) => RData::A(A(v4)),
        IpAddr::V6(v6) => RData::AAAA(AAAA(v6)),
    };
    Record::from_rdata(name, ttl, rdata)
}

pub fn cname_record(owner: &str, target: &str) -> Record {
    Record::from_rdata(
        Name::from_str(owner).unwrap(),
        300,
        RData::CNAME(CNAME(Name::from_str(target).unwrap())),
    )
}

pub fn answer_addresses(message: &Message) -> Vec<IpAddr> {
    message
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect()
}

pub fn default_rules() -> RewriteRules {
    RewriteRules::new(
        IpRangeSet::parse(AddressFamily::V4, CDN_IPV4).unwrap(),
        IpRangeSet::parse(AddressFamily::V6, CDN_IPV6).unwrap(),
        CandidatePool::parse(AddressFamily::V4, CANDIDATES_IPV4).unwrap(),
        CandidatePool::parse(AddressFamily::V6, CANDIDATES_IPV6).unwrap(),
    )
}

/// Same pools, but no CDN ranges at all: nothing can be classified as a member.
pub fn rules_without_ranges() -> Arc<RewriteRules> {
    let mut rules = default_rules();
    rules.cdn_ipv4 = IpRangeSet::new(AddressFamily::V4, vec![]);
    rules.cdn_ipv6 = IpRangeSet::new(AddressFamily::V6, vec![]);
    Arc::new(rules)
}

pub fn candidate_ips(entries: &[&str]) -> Vec<IpAddr> {
    entries.iter().map(|e| e.parse().unwrap()).collect()
}
