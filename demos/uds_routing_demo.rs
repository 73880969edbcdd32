use someip_diag::diag::{Context, OfferState};
use someip_diag::logging::{self, LogFacade};
use someip_diag::runtime::config::{InstanceConfig, RequiredServiceConfig};
use someip_diag::{
    CancellationHandler, DiagRuntime, LeaseTimer, MetaInfo, OperationOutput, ResponseFuture,
    RoutableUdsService, SdEntry, SdMessage, SdPacket, SomeIpMessage, TokioLeaseTimer,
};
use std::sync::Arc;

/// ReadDataByIdentifier for a single VIN identifier.
struct ReadVin {
    state: OfferState,
}

impl RoutableUdsService for ReadVin {
    fn is_offered(&self) -> bool {
        self.state.is_offered()
    }

    fn handle_message(&self, request: &[u8], meta_info: &MetaInfo, _cancellation: CancellationHandler) -> ResponseFuture {
        println!("ReadVin: request {:02x?} from {:?}", request, meta_info.get("source_address"));
        let mut response = vec![0x62, 0xF1, 0x90];
        response.extend_from_slice(b"WDD1234567890ABCD");
        ResponseFuture::ready(OperationOutput::new(response))
    }
}

fn main() {
    logging::init();
    println!("Starting UDS routing demo...");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("Failed to start tokio runtime: {}", e);
            return;
        }
    };
    let handle = rt.handle().clone();

    let mut config = InstanceConfig::default();
    config.required.insert(
        "vin".to_string(),
        RequiredServiceConfig { service_id: 0x1234, instance_id: 1, major_version: 1, requested: true },
    );
    let runtime = DiagRuntime::from_config("demo", config, LogFacade::new(), move || {
        TokioLeaseTimer::new(handle.clone()) as Arc<dyn LeaseTimer>
    });

    // 1. Discovery: a provider offers service 0x1234 with a 3 s lease
    let offer = SdMessage::new(SdPacket::new(vec![SdEntry::offer(0x1234, 1, 1, 0, 3, 0)], vec![]));
    match runtime.handle_sd_datagram(&offer.to_bytes()) {
        Ok(applied) => println!("Applied {} SD entries", applied),
        Err(e) => println!("SD datagram rejected: {}", e),
    }
    match runtime.wait_for_service("vin") {
        Ok(()) => println!("Service 'vin' is {:?}", runtime.service_state("vin")),
        Err(e) => println!("Service 'vin' not available: {}", e),
    }

    // 2. Routing: 0x22 is served, 0x2E is not
    let service = Arc::new(ReadVin { state: OfferState::new() });
    if let Err(e) = service.state.offer() {
        println!("Offer failed: {}", e);
        return;
    }
    runtime.router().register(0x22, &service);

    let meta = MetaInfo::new(Context::DoIp).with_value("source_address", "0x0E80");
    for request in [vec![0x22, 0xF1, 0x90], vec![0x2E, 0xF1, 0x90, 0x00]] {
        let future = runtime
            .router()
            .route(request[0], &request, &meta, CancellationHandler::detached());
        let resolution = rt.block_on(future);
        println!("SID 0x{:02x} -> {:02x?}", request[0], resolution);
    }

    // 3. Withdraw the service; the same request now gets a negative response
    service.state.stop_offer();
    let resolution = rt.block_on(runtime.router().route(0x22, &[0x22, 0xF1, 0x90], &meta, CancellationHandler::detached()));
    println!("After stop offer: {:02x?}", resolution);

    println!("Demo complete.");
}
