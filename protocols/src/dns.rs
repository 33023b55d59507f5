use std::net::IpAddr;

use anyhow::{Context, ensure};
use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsQuery, DnsTypes, MutableDnsPacket, Opcode, Retcode};

pub const DNS_HDR_LEN: usize = 12;
pub const DNS_PORT: u16 = 53;

const MAX_LABEL_LEN: usize = 63;

/// What a resolver told us about a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub id: u16,
    pub response_code: u8,
    pub addresses: Vec<IpAddr>,
}

impl DnsAnswer {
    /// The server answered NOERROR with at least one address.
    pub fn resolved(&self) -> bool {
        self.response_code == 0 && !self.addresses.is_empty()
    }
}

pub fn create_a_packet(name: &str, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = create_a_query(name)?;
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let total: usize = DNS_HDR_LEN + qlen;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    let type_bytes: [u8; 2] = query.qtype.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&type_bytes);
    cursor += 2;

    let class_bytes: [u8; 2] = query.qclass.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&class_bytes);

    Ok(buffer)
}

/// Parses a resolver response, keeping A and AAAA answers.
pub fn parse_answer(payload: &[u8]) -> anyhow::Result<DnsAnswer> {
    let packet = Packet::parse(payload).context("Failed to parse DNS packet")?;
    ensure!(!packet.header.query, "packet is a query, not a response");

    let addresses: Vec<IpAddr> = packet
        .answers
        .iter()
        .filter_map(|record| match &record.data {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect();

    Ok(DnsAnswer {
        id: packet.header.id,
        response_code: response_code_value(packet.header.response_code),
        addresses,
    })
}

fn response_code_value(code: ResponseCode) -> u8 {
    match code {
        ResponseCode::NoError => 0,
        ResponseCode::FormatError => 1,
        ResponseCode::ServerFailure => 2,
        ResponseCode::NameError => 3,
        ResponseCode::NotImplemented => 4,
        ResponseCode::Refused => 5,
        ResponseCode::Reserved(value) => value,
    }
}

fn create_a_query(name: &str) -> anyhow::Result<DnsQuery> {
    let qname: Vec<u8> = encode_dns_name(name)?;
    let query: DnsQuery = DnsQuery {
        qname,
        qtype: DnsTypes::A,
        qclass: DnsClass(1),
        payload: Vec::new(),
    };
    Ok(query)
}

fn encode_dns_name(name: &str) -> anyhow::Result<Vec<u8>> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        ensure!(label.len() <= MAX_LABEL_LEN, "label '{label}' is longer than {MAX_LABEL_LEN} bytes");
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    ensure!(!encoded.is_empty(), "cannot query an empty name");
    encoded.push(0);
    Ok(encoded)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
