//! Extension discovery
//!
//! After setup every known extension is queried in a fixed order. Present
//! ones are registered and asked for their version. The connection becomes
//! ready once every query and version request has been answered.

use super::{Client, ConnectionState};
use crate::extensions::{ExtensionKind, ExtensionVersion, QueryExtensionReply};
use crate::protocol::X11Result;

impl Client {
    pub(crate) fn start_discovery(&mut self) {
        self.state = ConnectionState::Discovering;
        for kind in ExtensionKind::DISCOVERY_ORDER {
            self.discovery_outstanding += 1;
            let result = self.query_extension(kind.name(), move |client, reply| {
                client.extension_queried(kind, reply);
            });
            if let Err(e) = result {
                log::warn!("Could not query extension {}: {}", kind.name(), e);
                self.discovery_outstanding -= 1;
            }
        }
        if self.discovery_outstanding == 0 {
            self.finish_connect();
        }
    }

    fn extension_queried(&mut self, kind: ExtensionKind, reply: X11Result<QueryExtensionReply>) {
        match reply {
            Ok(reply) if reply.present => {
                self.registry_mut().register(kind.create(reply.info()));
                self.negotiate_version(kind);
            }
            Ok(_) => log::debug!("Extension {} not present", kind.name()),
            Err(e) => log::warn!("QueryExtension {} failed: {}", kind.name(), e),
        }
        self.discovery_step_done();
    }

    fn negotiate_version(&mut self, kind: ExtensionKind) {
        let name = kind.name();
        let done = move |client: &mut Client, result: X11Result<ExtensionVersion>| {
            match result {
                Ok(version) => client.registry_mut().set_version(name, version),
                Err(e) => log::warn!("Version negotiation for {} failed: {}", name, e),
            }
            client.discovery_step_done();
        };

        let result = match kind {
            ExtensionKind::GenericEvent => self.ge_query_version(1, 0, done),
            ExtensionKind::Shape => self.shape_query_version(done),
            ExtensionKind::Shm => {
                self.shm_query_version(move |client, result| done(client, result.map(|v| v.version())))
            }
            ExtensionKind::BigRequests => self.big_requests_enable(move |client, result| {
                if let Err(e) = result {
                    log::warn!("Enabling {} failed: {}", name, e);
                }
                client.discovery_step_done();
            }),
            ExtensionKind::Sync => self.sync_initialize(3, 1, done),
            ExtensionKind::Xfixes => self.xfixes_query_version(5, 0, done),
            ExtensionKind::Randr => self.randr_query_version(1, 5, done),
            ExtensionKind::Present => self.present_query_version(1, 0, done),
            ExtensionKind::Xinput => self.xi_query_version(2, 4, done),
            ExtensionKind::Dri3 => self.dri3_query_version(1, 0, done),
        };
        match result {
            Ok(_) => self.discovery_outstanding += 1,
            Err(e) => log::warn!("Could not negotiate {} version: {}", name, e),
        }
    }

    fn discovery_step_done(&mut self) {
        self.discovery_outstanding = self.discovery_outstanding.saturating_sub(1);
        if self.discovery_outstanding == 0 {
            self.finish_connect();
        }
    }
}
