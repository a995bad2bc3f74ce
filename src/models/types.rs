//! Enumerations of the threat model.
//!
//! Every enumeration round-trips through the kebab-case keyword used in model
//! documents. Sensitivity-like enumerations are declared in ascending order so
//! the derived `Ord` matches their meaning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// All values in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Keyword used in model documents.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

keyword_enum! {
    pub enum Confidentiality {
        Public => "public",
        Internal => "internal",
        Restricted => "restricted",
        Confidential => "confidential",
        StrictlyConfidential => "strictly-confidential",
    }
}

impl Confidentiality {
    /// Attractiveness of an asset with this rating of its own.
    pub fn asset_attractiveness(&self) -> f64 {
        match self {
            Confidentiality::Public => 8.0,
            Confidentiality::Internal => 13.0,
            Confidentiality::Restricted => 21.0,
            Confidentiality::Confidential => 34.0,
            Confidentiality::StrictlyConfidential => 55.0,
        }
    }

    /// Attractiveness contributed by processed or stored data.
    pub fn processed_or_stored_attractiveness(&self) -> f64 {
        match self {
            Confidentiality::Public => 5.0,
            Confidentiality::Internal => 8.0,
            Confidentiality::Restricted => 13.0,
            Confidentiality::Confidential => 21.0,
            Confidentiality::StrictlyConfidential => 34.0,
        }
    }

    /// Attractiveness contributed by data in transit.
    pub fn transferred_attractiveness(&self) -> f64 {
        match self {
            Confidentiality::Public => 2.0,
            Confidentiality::Internal => 3.0,
            Confidentiality::Restricted => 5.0,
            Confidentiality::Confidential => 8.0,
            Confidentiality::StrictlyConfidential => 13.0,
        }
    }
}

impl Default for Confidentiality {
    fn default() -> Self {
        Confidentiality::Internal
    }
}

keyword_enum! {
    /// Integrity and availability rating.
    pub enum Criticality {
        Archive => "archive",
        Operational => "operational",
        Important => "important",
        Critical => "critical",
        MissionCritical => "mission-critical",
    }
}

impl Criticality {
    pub fn asset_attractiveness(&self) -> f64 {
        match self {
            Criticality::Archive => 5.0,
            Criticality::Operational => 8.0,
            Criticality::Important => 13.0,
            Criticality::Critical => 21.0,
            Criticality::MissionCritical => 34.0,
        }
    }

    pub fn processed_or_stored_attractiveness(&self) -> f64 {
        match self {
            Criticality::Archive => 3.0,
            Criticality::Operational => 5.0,
            Criticality::Important => 8.0,
            Criticality::Critical => 13.0,
            Criticality::MissionCritical => 21.0,
        }
    }

    pub fn transferred_attractiveness(&self) -> f64 {
        match self {
            Criticality::Archive => 2.0,
            Criticality::Operational => 3.0,
            Criticality::Important => 5.0,
            Criticality::Critical => 8.0,
            Criticality::MissionCritical => 13.0,
        }
    }
}

impl Default for Criticality {
    fn default() -> Self {
        Criticality::Operational
    }
}

keyword_enum! {
    pub enum Quantity {
        VeryFew => "very-few",
        Few => "few",
        Many => "many",
        VeryMany => "very-many",
    }
}

impl Quantity {
    pub fn factor(&self) -> f64 {
        match self {
            Quantity::VeryFew => 1.0,
            Quantity::Few => 2.0,
            Quantity::Many => 3.0,
            Quantity::VeryMany => 5.0,
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Few
    }
}

keyword_enum! {
    pub enum Usage {
        Business => "business",
        DevOps => "devops",
    }
}

impl Default for Usage {
    fn default() -> Self {
        Usage::Business
    }
}

keyword_enum! {
    /// Encryption at rest, weakest first.
    pub enum EncryptionStyle {
        None => "none",
        Transparent => "transparent",
        DataWithSymmetricSharedKey => "data-with-symmetric-shared-key",
        DataWithAsymmetricSharedKey => "data-with-asymmetric-shared-key",
        DataWithEnduserIndividualKey => "data-with-enduser-individual-key",
    }
}

impl Default for EncryptionStyle {
    fn default() -> Self {
        EncryptionStyle::None
    }
}

keyword_enum! {
    pub enum DataFormat {
        Json => "json",
        Xml => "xml",
        Serialization => "serialization",
        File => "file",
        Csv => "csv",
    }
}

keyword_enum! {
    pub enum Protocol {
        UnknownProtocol => "unknown-protocol",
        Http => "http",
        Https => "https",
        Ws => "ws",
        Wss => "wss",
        ReverseProxyWebProtocol => "reverse-proxy-web-protocol",
        ReverseProxyWebProtocolEncrypted => "reverse-proxy-web-protocol-encrypted",
        Mqtt => "mqtt",
        Jdbc => "jdbc",
        JdbcEncrypted => "jdbc-encrypted",
        Odbc => "odbc",
        OdbcEncrypted => "odbc-encrypted",
        SqlAccessProtocol => "sql-access-protocol",
        SqlAccessProtocolEncrypted => "sql-access-protocol-encrypted",
        NosqlAccessProtocol => "nosql-access-protocol",
        NosqlAccessProtocolEncrypted => "nosql-access-protocol-encrypted",
        Binary => "binary",
        BinaryEncrypted => "binary-encrypted",
        Text => "text",
        TextEncrypted => "text-encrypted",
        Ssh => "ssh",
        SshTunnel => "ssh-tunnel",
        Smtp => "smtp",
        SmtpEncrypted => "smtp-encrypted",
        Pop3 => "pop3",
        Pop3Encrypted => "pop3-encrypted",
        Imap => "imap",
        ImapEncrypted => "imap-encrypted",
        Ftp => "ftp",
        Ftps => "ftps",
        Sftp => "sftp",
        Scp => "scp",
        Ldap => "ldap",
        Ldaps => "ldaps",
        Jms => "jms",
        Nfs => "nfs",
        Smb => "smb",
        SmbEncrypted => "smb-encrypted",
        LocalFileAccess => "local-file-access",
        Nrpe => "nrpe",
        Xmpp => "xmpp",
        Iiop => "iiop",
        IiopEncrypted => "iiop-encrypted",
        Jrmp => "jrmp",
        JrmpEncrypted => "jrmp-encrypted",
        InProcessLibraryCall => "in-process-library-call",
        ContainerSpawning => "container-spawning",
    }
}

impl Protocol {
    /// Communication that never leaves the host process or machine.
    pub fn is_process_local(&self) -> bool {
        matches!(
            self,
            Protocol::InProcessLibraryCall | Protocol::LocalFileAccess | Protocol::ContainerSpawning
        )
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(
            self,
            Protocol::Https
                | Protocol::Wss
                | Protocol::JdbcEncrypted
                | Protocol::OdbcEncrypted
                | Protocol::NosqlAccessProtocolEncrypted
                | Protocol::SqlAccessProtocolEncrypted
                | Protocol::BinaryEncrypted
                | Protocol::TextEncrypted
                | Protocol::Ssh
                | Protocol::SshTunnel
                | Protocol::Ftps
                | Protocol::Sftp
                | Protocol::Scp
                | Protocol::Ldaps
                | Protocol::ReverseProxyWebProtocolEncrypted
                | Protocol::IiopEncrypted
                | Protocol::JrmpEncrypted
                | Protocol::SmbEncrypted
                | Protocol::SmtpEncrypted
                | Protocol::Pop3Encrypted
                | Protocol::ImapEncrypted
        )
    }

    /// Database access protocols; `lax` also admits generic HTTP and binary transports.
    pub fn is_potential_database_access(&self, lax: bool) -> bool {
        let strict = matches!(
            self,
            Protocol::JdbcEncrypted
                | Protocol::OdbcEncrypted
                | Protocol::NosqlAccessProtocolEncrypted
                | Protocol::SqlAccessProtocolEncrypted
                | Protocol::Jdbc
                | Protocol::Odbc
                | Protocol::NosqlAccessProtocol
                | Protocol::SqlAccessProtocol
        );
        strict
            || (lax
                && matches!(
                    self,
                    Protocol::Https | Protocol::Http | Protocol::Binary | Protocol::BinaryEncrypted
                ))
    }

    pub fn is_potential_web_access(&self) -> bool {
        matches!(
            self,
            Protocol::Http
                | Protocol::Https
                | Protocol::Ws
                | Protocol::Wss
                | Protocol::ReverseProxyWebProtocol
                | Protocol::ReverseProxyWebProtocolEncrypted
        )
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::UnknownProtocol
    }
}

keyword_enum! {
    /// Authentication strength, weakest first.
    pub enum Authentication {
        None => "none",
        Credentials => "credentials",
        SessionId => "session-id",
        Token => "token",
        ClientCertificate => "client-certificate",
        TwoFactor => "two-factor",
        Externalized => "externalized",
    }
}

impl Default for Authentication {
    fn default() -> Self {
        Authentication::None
    }
}

keyword_enum! {
    pub enum Authorization {
        None => "none",
        TechnicalUser => "technical-user",
        EnduserIdentityPropagation => "enduser-identity-propagation",
    }
}

impl Default for Authorization {
    fn default() -> Self {
        Authorization::None
    }
}

keyword_enum! {
    pub enum TechnicalAssetType {
        ExternalEntity => "external-entity",
        Process => "process",
        Datastore => "datastore",
    }
}

impl Default for TechnicalAssetType {
    fn default() -> Self {
        TechnicalAssetType::Process
    }
}

keyword_enum! {
    pub enum TechnicalAssetSize {
        System => "system",
        Service => "service",
        Application => "application",
        Component => "component",
    }
}

impl Default for TechnicalAssetSize {
    fn default() -> Self {
        TechnicalAssetSize::Application
    }
}

keyword_enum! {
    pub enum TechnicalAssetMachine {
        Physical => "physical",
        Virtual => "virtual",
        Container => "container",
        Serverless => "serverless",
    }
}

impl Default for TechnicalAssetMachine {
    fn default() -> Self {
        TechnicalAssetMachine::Virtual
    }
}

keyword_enum! {
    pub enum Technology {
        UnknownTechnology => "unknown-technology",
        ClientSystem => "client-system",
        Browser => "browser",
        Desktop => "desktop",
        MobileApp => "mobile-app",
        DevOpsClient => "devops-client",
        WebServer => "web-server",
        WebApplication => "web-application",
        ApplicationServer => "application-server",
        Database => "database",
        FileServer => "file-server",
        LocalFileSystem => "local-file-system",
        Erp => "erp",
        Cms => "cms",
        WebServiceRest => "web-service-rest",
        WebServiceSoap => "web-service-soap",
        Ejb => "ejb",
        SearchIndex => "search-index",
        SearchEngine => "search-engine",
        ServiceRegistry => "service-registry",
        ReverseProxy => "reverse-proxy",
        LoadBalancer => "load-balancer",
        BuildPipeline => "build-pipeline",
        SourcecodeRepository => "sourcecode-repository",
        ArtifactRegistry => "artifact-registry",
        CodeInspectionPlatform => "code-inspection-platform",
        Monitoring => "monitoring",
        LdapServer => "ldap-server",
        ContainerPlatform => "container-platform",
        BatchProcessing => "batch-processing",
        EventListener => "event-listener",
        IdentityProvider => "identity-provider",
        IdentityStoreLdap => "identity-store-ldap",
        IdentityStoreDatabase => "identity-store-database",
        Tool => "tool",
        Cli => "cli",
        Task => "task",
        Function => "function",
        Gateway => "gateway",
        IotDevice => "iot-device",
        MessageQueue => "message-queue",
        StreamProcessing => "stream-processing",
        ServiceMesh => "service-mesh",
        DataLake => "data-lake",
        BigDataPlatform => "big-data-platform",
        ReportEngine => "report-engine",
        Ai => "ai",
        MailServer => "mail-server",
        Vault => "vault",
        Hsm => "hsm",
        Waf => "waf",
        Ids => "ids",
        Ips => "ips",
        Scheduler => "scheduler",
        Mainframe => "mainframe",
        BlockStorage => "block-storage",
        Library => "library",
    }
}

impl Technology {
    pub fn is_exclusively_frontend(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            ClientSystem
                | Browser
                | Desktop
                | MobileApp
                | DevOpsClient
                | Cms
                | ReverseProxy
                | Waf
                | LoadBalancer
                | Gateway
                | IotDevice
        )
    }

    pub fn is_exclusively_backend(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            Database
                | IdentityProvider
                | IdentityStoreLdap
                | IdentityStoreDatabase
                | Erp
                | WebServiceRest
                | WebServiceSoap
                | Ejb
                | SearchIndex
                | SearchEngine
                | ContainerPlatform
                | BatchProcessing
                | EventListener
                | DataLake
                | BigDataPlatform
                | MessageQueue
                | StreamProcessing
                | ServiceMesh
                | Vault
                | Hsm
                | Scheduler
                | Mainframe
                | FileServer
                | BlockStorage
        )
    }

    /// Components that legitimately talk in plaintext (sensors, probes).
    pub fn is_unprotected_communications_tolerated(&self) -> bool {
        matches!(self, Technology::Monitoring | Technology::Ids | Technology::Ips)
    }

    pub fn is_close_to_high_value_targets_tolerated(&self) -> bool {
        use Technology::*;
        matches!(self, Monitoring | Ids | Ips | LoadBalancer | ReverseProxy)
    }

    pub fn is_less_protected_type(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            ClientSystem
                | Browser
                | Desktop
                | MobileApp
                | DevOpsClient
                | WebServer
                | WebApplication
                | ApplicationServer
                | Cms
                | WebServiceRest
                | WebServiceSoap
                | Ejb
                | BuildPipeline
                | SourcecodeRepository
                | ArtifactRegistry
                | CodeInspectionPlatform
                | Monitoring
                | IotDevice
                | Ai
                | MailServer
                | Scheduler
                | Mainframe
        )
    }

    pub fn is_identity_related(&self) -> bool {
        matches!(
            self,
            Technology::IdentityProvider
                | Technology::IdentityStoreLdap
                | Technology::IdentityStoreDatabase
        )
    }

    pub fn is_identity_store(&self) -> bool {
        matches!(self, Technology::IdentityStoreLdap | Technology::IdentityStoreDatabase)
    }

    pub fn is_usually_storing_enduser_data(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            Database
                | Erp
                | FileServer
                | LocalFileSystem
                | BlockStorage
                | MailServer
                | StreamProcessing
                | MessageQueue
        )
    }

    pub fn is_traffic_forwarding(&self) -> bool {
        matches!(self, Technology::LoadBalancer | Technology::ReverseProxy | Technology::Waf)
    }

    pub fn is_web_application(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            WebServer
                | WebApplication
                | ApplicationServer
                | Erp
                | Cms
                | IdentityProvider
                | ReportEngine
        )
    }

    pub fn is_web_service(&self) -> bool {
        matches!(self, Technology::WebServiceRest | Technology::WebServiceSoap)
    }

    pub fn is_client(&self) -> bool {
        use Technology::*;
        matches!(self, ClientSystem | Browser | Desktop | MobileApp | DevOpsClient | IotDevice)
    }

    pub fn is_development_relevant(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            BuildPipeline
                | SourcecodeRepository
                | ArtifactRegistry
                | CodeInspectionPlatform
                | DevOpsClient
        )
    }

    pub fn is_security_control_related(&self) -> bool {
        use Technology::*;
        matches!(self, Vault | Hsm | Waf | Ids | Ips)
    }

    pub fn is_embedded_component(&self) -> bool {
        matches!(self, Technology::Library)
    }

    /// Technologies that attract attackers regardless of the data they hold.
    pub fn is_high_value_target(&self) -> bool {
        use Technology::*;
        matches!(
            self,
            Database
                | IdentityProvider
                | Vault
                | Hsm
                | WebServer
                | WebApplication
                | LoadBalancer
                | ReverseProxy
                | Gateway
        )
    }
}

impl Default for Technology {
    fn default() -> Self {
        Technology::UnknownTechnology
    }
}

keyword_enum! {
    pub enum TrustBoundaryType {
        NetworkOnPrem => "network-on-prem",
        NetworkDedicatedHoster => "network-dedicated-hoster",
        NetworkVirtualLan => "network-virtual-lan",
        NetworkCloudProvider => "network-cloud-provider",
        NetworkCloudSecurityGroup => "network-cloud-security-group",
        NetworkPolicyNamespaceIsolation => "network-policy-namespace-isolation",
        ExecutionEnvironment => "execution-environment",
    }
}

impl TrustBoundaryType {
    pub fn is_network_boundary(&self) -> bool {
        !matches!(self, TrustBoundaryType::ExecutionEnvironment)
    }

    pub fn is_within_cloud(&self) -> bool {
        matches!(
            self,
            TrustBoundaryType::NetworkCloudProvider | TrustBoundaryType::NetworkCloudSecurityGroup
        )
    }
}

impl Default for TrustBoundaryType {
    fn default() -> Self {
        TrustBoundaryType::NetworkVirtualLan
    }
}

keyword_enum! {
    pub enum RiskSeverity {
        Low => "low",
        Medium => "medium",
        Elevated => "elevated",
        High => "high",
        Critical => "critical",
    }
}

impl Default for RiskSeverity {
    fn default() -> Self {
        RiskSeverity::Medium
    }
}

keyword_enum! {
    pub enum RiskExploitationLikelihood {
        Unlikely => "unlikely",
        Likely => "likely",
        VeryLikely => "very-likely",
        Frequent => "frequent",
    }
}

impl RiskExploitationLikelihood {
    pub fn weight(&self) -> u32 {
        match self {
            RiskExploitationLikelihood::Unlikely => 1,
            RiskExploitationLikelihood::Likely => 2,
            RiskExploitationLikelihood::VeryLikely => 3,
            RiskExploitationLikelihood::Frequent => 4,
        }
    }
}

impl Default for RiskExploitationLikelihood {
    fn default() -> Self {
        RiskExploitationLikelihood::Likely
    }
}

keyword_enum! {
    pub enum RiskExploitationImpact {
        Low => "low",
        Medium => "medium",
        High => "high",
        VeryHigh => "very-high",
    }
}

impl RiskExploitationImpact {
    pub fn weight(&self) -> u32 {
        match self {
            RiskExploitationImpact::Low => 1,
            RiskExploitationImpact::Medium => 2,
            RiskExploitationImpact::High => 3,
            RiskExploitationImpact::VeryHigh => 4,
        }
    }
}

impl Default for RiskExploitationImpact {
    fn default() -> Self {
        RiskExploitationImpact::Medium
    }
}

keyword_enum! {
    pub enum RiskFunction {
        BusinessSide => "business-side",
        Architecture => "architecture",
        Development => "development",
        Operations => "operations",
    }
}

keyword_enum! {
    pub enum Stride {
        Spoofing => "spoofing",
        Tampering => "tampering",
        Repudiation => "repudiation",
        InformationDisclosure => "information-disclosure",
        DenialOfService => "denial-of-service",
        ElevationOfPrivilege => "elevation-of-privilege",
    }
}

keyword_enum! {
    pub enum DataBreachProbability {
        Improbable => "improbable",
        Possible => "possible",
        Probable => "probable",
    }
}

impl Default for DataBreachProbability {
    fn default() -> Self {
        DataBreachProbability::Possible
    }
}

keyword_enum! {
    /// Tracking status, in reporting order.
    pub enum RiskStatus {
        Unchecked => "unchecked",
        InDiscussion => "in-discussion",
        Accepted => "accepted",
        InProgress => "in-progress",
        Mitigated => "mitigated",
        FalsePositive => "false-positive",
    }
}

impl RiskStatus {
    pub fn is_still_at_risk(&self) -> bool {
        matches!(
            self,
            RiskStatus::Unchecked
                | RiskStatus::InDiscussion
                | RiskStatus::Accepted
                | RiskStatus::InProgress
        )
    }
}

impl Default for RiskStatus {
    fn default() -> Self {
        RiskStatus::Unchecked
    }
}
