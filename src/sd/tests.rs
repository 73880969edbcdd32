#[cfg(test)]
mod tests {
    use crate::codec::{SomeIpSerialize, SomeIpDeserialize};
    use crate::logging::LogFacade;
    use crate::sd::client::{RequiredService, SdClient};
    use crate::sd::entries::{EntryType, SdEntry};
    use crate::sd::machine::ClientServiceState;
    use crate::sd::options::{SdOption, PROTO_TCP, PROTO_UDP};
    use crate::sd::packet::SdPacket;
    use crate::sd::timer::{LeaseTimer, ManualLeaseTimer};
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
    use std::time::Duration;

    fn udp_option(port: u16) -> SdOption {
        SdOption::Ipv4Endpoint {
            address: Ipv4Addr::new(192, 168, 1, 10),
            transport_proto: PROTO_UDP,
            port,
        }
    }

    fn client(service: RequiredService) -> (SdClient, std::sync::Arc<ManualLeaseTimer>) {
        let timer = ManualLeaseTimer::new();
        let client = SdClient::new(service, timer.clone(), LogFacade::new());
        client.start();
        (client, timer)
    }

    #[test]
    fn test_entry_layout() {
        let entry = SdEntry::offer(0x1234, 0x5678, 1, 2, 0x0000_0100, 1);
        let buf = entry.to_vec();

        assert_eq!(buf.len(), 16);
        assert_eq!(buf[0], 0x01);
        assert_eq!(buf[3], 0x10);
        assert_eq!(buf[4..6], [0x12, 0x34]);
        assert_eq!(buf[9..12], [0x00, 0x01, 0x00]);
        assert_eq!(buf[12..16], [0, 0, 0, 2]);
    }

    #[test]
    fn test_offer_ttl_is_clamped_to_24_bits() {
        let entry = SdEntry::offer(0x1234, 1, 1, 0, u32::MAX, 0);
        assert_eq!(entry.ttl, SdEntry::MAX_TTL);
        assert!(SdEntry::stop_offer(0x1234, 1, 1, 0).is_stop_offer());
    }

    #[test]
    fn test_packet_decode() {
        let packet = SdPacket::new(
            vec![SdEntry::offer(0x1234, 0x5678, 1, 2, 0x00AB_CDEF, 2)],
            vec![
                udp_option(30490),
                SdOption::Ipv6Endpoint {
                    address: Ipv6Addr::LOCALHOST,
                    transport_proto: PROTO_TCP,
                    port: 8080,
                },
            ],
        );

        let buf = packet.to_vec();
        let decoded = SdPacket::deserialize(&mut &buf[..]).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.entries[0].ttl, 0x00AB_CDEF);
        assert_eq!(
            decoded.options[0].endpoint(),
            Some(SocketAddr::from((Ipv4Addr::new(192, 168, 1, 10), 30490)))
        );
    }

    #[test]
    fn test_unknown_option_passthrough() {
        let packet = SdPacket::new(vec![], vec![SdOption::Unknown { type_id: 0x14, data: vec![0, 1, 2] }]);
        let buf = packet.to_vec();
        // Flags(4) + EntLen(4) + OptLen(4) + Len(2) + Type(1) + Data(3)
        assert_eq!(buf.len(), 18);

        let decoded = SdPacket::deserialize(&mut &buf[..]).unwrap();
        assert_eq!(decoded.options, packet.options);
        assert_eq!(decoded.options[0].endpoint(), None);
    }

    #[test]
    fn test_entries_length_must_be_aligned() {
        let mut buf = SdPacket::new(vec![SdEntry::offer(1, 1, 1, 0, 3, 0)], vec![]).to_vec();
        buf[7] = 15;
        assert!(SdPacket::deserialize(&mut &buf[..]).is_err());
    }

    #[test]
    fn test_options_for_entry() {
        let mut entry = SdEntry::offer(0x1234, 1, 1, 0, 3, 1);
        entry.index_1 = 1;
        entry.index_2 = 0;
        entry.number_of_opts_2 = 1;
        let packet = SdPacket::new(vec![entry.clone()], vec![udp_option(1), udp_option(2)]);

        assert_eq!(packet.options_for(&entry), vec![udp_option(2), udp_option(1)]);

        entry.index_1 = 5;
        assert_eq!(packet.options_for(&entry), vec![udp_option(1)]);
    }

    #[test]
    fn test_required_service_matching() {
        let exact = RequiredService::new(0x1234, 0x0001, 2);
        assert!(exact.matches(&SdEntry::offer(0x1234, 0x0001, 2, 0, 3, 0)));
        assert!(!exact.matches(&SdEntry::offer(0x1234, 0x0002, 2, 0, 3, 0)));
        assert!(!exact.matches(&SdEntry::offer(0x1234, 0x0001, 3, 0, 3, 0)));

        let any = RequiredService::any_instance(0x1234);
        assert!(any.matches(&SdEntry::offer(0x1234, 0x0042, 7, 0, 3, 0)));
        assert!(!any.matches(&SdEntry::offer(0x4321, 0x0042, 7, 0, 3, 0)));
    }

    #[test]
    fn test_client_follows_offers() {
        let (client, timer) = client(RequiredService::any_instance(0x1234));

        let offer = SdPacket::new(vec![SdEntry::offer(0x1234, 1, 1, 0, 3, 1)], vec![udp_option(30501)]);
        assert_eq!(client.handle_packet(&offer), 1);
        assert_eq!(client.state(), ClientServiceState::ServiceReady);
        assert_eq!(timer.duration(), Some(Duration::from_secs(3)));
        assert_eq!(client.endpoints(), vec![udp_option(30501)]);

        let stop = SdPacket::new(vec![SdEntry::stop_offer(0x1234, 1, 1, 0)], vec![]);
        assert_eq!(client.handle_packet(&stop), 1);
        assert_eq!(client.state(), ClientServiceState::Stopped);
        assert!(!timer.is_running());
        assert!(client.endpoints().is_empty());

        // Stopped until restarted
        assert_eq!(client.handle_packet(&offer), 0);
        assert_eq!(client.state(), ClientServiceState::Stopped);
        client.start();
        assert_eq!(client.handle_packet(&offer), 1);
        assert_eq!(client.state(), ClientServiceState::ServiceReady);
    }

    #[test]
    fn test_client_ignores_foreign_entries() {
        let (client, _timer) = client(RequiredService::new(0x1234, 1, 1));

        let mut find = SdEntry::offer(0x1234, 1, 1, 0, 3, 0);
        find.entry_type = EntryType::FindService;
        let packet = SdPacket::new(vec![find, SdEntry::offer(0x9999, 1, 1, 0, 3, 0)], vec![]);

        assert_eq!(client.handle_packet(&packet), 0);
        assert_eq!(client.state(), ClientServiceState::InitialWaitPhase);
    }
}
