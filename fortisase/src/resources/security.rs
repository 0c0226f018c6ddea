//! Security profiles and policies

use super::{CreateMode, DeletePolicy, ResourceDefinition};
use crate::fields::{Check, Field, FieldKind, NUMBER, REFERENCE, STRING};

const ENABLE_DISABLE: Check = Check::OneOf(&["enable", "disable"]);
const PROFILE_NAME: Check = Check::Length(1, 35);
const FILTER_ACTION: Check = Check::OneOf(&["allow", "monitor", "block"]);

const PRIMARY_KEY: Field = Field::string("primary_key", "primaryKey")
    .required()
    .check(PROFILE_NAME)
    .describe("Name of the object");

// DLP

const DLP_RULE: FieldKind = FieldKind::Object(DLP_RULE_FIELDS);
const DLP_RULE_FIELDS: &[Field] = &[
    Field::string("name", "name").describe("Rule name"),
    Field::reference("sensor", "sensor").describe("DLP sensor the rule matches with"),
    Field::string("action", "action")
        .check(Check::OneOf(&["allow", "monitor", "block"]))
        .describe("What to do with matching traffic"),
    Field::string("severity", "severity")
        .check(Check::OneOf(&["info", "low", "medium", "high", "critical"])),
    Field::set("protocols", "protocols", &STRING)
        .describe("Protocols inspected, e.g. http-get, http-post, ftp, smtp"),
    Field::string("file_type", "fileType"),
    Field::string("status", "status").check(ENABLE_DISABLE),
];

pub static DLP_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_dlp_profile",
    description: "Data loss prevention profile",
    path: "/resource-api/v1/security/dlp-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::list("dlp_rules", "dlpRules", &DLP_RULE)
            .describe("Ordered rules; the first match decides the action"),
        Field::string("comment", "comment").check(Check::Length(0, 255)),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: None,
    direction: false,
};

const DLP_SENSOR_ENTRY: FieldKind = FieldKind::Object(DLP_SENSOR_ENTRY_FIELDS);
const DLP_SENSOR_ENTRY_FIELDS: &[Field] = &[
    Field::reference("dictionary", "dictionary"),
    Field::number("count", "count").check(Check::Range(1.0, 255.0)),
    Field::string("status", "status").check(ENABLE_DISABLE),
];

pub static DLP_SENSOR: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_dlp_sensor",
    description: "DLP sensor grouping data dictionaries",
    path: "/resource-api/v1/security/dlp-sensors",
    fields: &[
        PRIMARY_KEY,
        Field::string("entry_matches", "entryMatches")
            .check(Check::OneOf(&["match-all", "match-any", "match-eq"])),
        Field::list("sensor_entries", "sensorEntries", &DLP_SENSOR_ENTRY),
        Field::string("comment", "comment").check(Check::Length(0, 255)),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: None,
    direction: false,
};

// Direction-qualified profiles. These exist under fixed names for every
// profile group, so creation is an upsert and deletion only forgets them.

pub static ANTIVIRUS_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_antivirus_profile",
    description: "Antivirus scanning per protocol",
    path: "/resource-api/v1/security/{direction}/antivirus-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::string("http", "http").check(ENABLE_DISABLE),
        Field::string("smtp", "smtp").check(ENABLE_DISABLE),
        Field::string("pop3", "pop3").check(ENABLE_DISABLE),
        Field::string("imap", "imap").check(ENABLE_DISABLE),
        Field::string("ftp", "ftp").check(ENABLE_DISABLE),
        Field::string("cifs", "cifs").check(ENABLE_DISABLE),
        Field::string("sandbox_mode", "sandboxMode")
            .check(Check::OneOf(&["disable", "monitor", "block"]))
            .describe("Submit files to FortiSandbox and what to do with the verdict"),
        Field::string("block_malicious_files", "blockMaliciousFiles").check(ENABLE_DISABLE),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

const CATEGORY_FILTER: FieldKind = FieldKind::Object(CATEGORY_FILTER_FIELDS);
const CATEGORY_FILTER_FIELDS: &[Field] = &[
    Field::reference("category", "category"),
    Field::string("action", "action").check(Check::OneOf(&[
        "allow",
        "monitor",
        "block",
        "warning",
        "authenticate",
    ])),
];

const URL_FILTER: FieldKind = FieldKind::Object(URL_FILTER_FIELDS);
const URL_FILTER_FIELDS: &[Field] = &[
    Field::string("url", "url"),
    Field::string("type", "type").check(Check::OneOf(&["simple", "wildcard", "regex"])),
    Field::string("action", "action")
        .check(Check::OneOf(&["allow", "monitor", "block", "exempt"])),
    Field::string("status", "status").check(ENABLE_DISABLE),
];

const CONTENT_FILTER: FieldKind = FieldKind::Object(CONTENT_FILTER_FIELDS);
const CONTENT_FILTER_FIELDS: &[Field] = &[
    Field::string("pattern", "pattern"),
    Field::string("pattern_type", "patternType").check(Check::OneOf(&["wildcard", "regexp"])),
    Field::string("action", "action").check(Check::OneOf(&["block", "exempt"])),
    Field::string("status", "status").check(ENABLE_DISABLE),
];

pub static WEB_FILTER_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_web_filter_profile",
    description: "Web filtering by FortiGuard category, URL and content",
    path: "/resource-api/v1/security/{direction}/web-filter-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::list("fortiguard_filters", "fortiguardFilters", &CATEGORY_FILTER),
        Field::list("fortiguard_local_categories", "fortiguardLocalCategories", &CATEGORY_FILTER),
        Field::list("url_filters", "urlFilters", &URL_FILTER),
        Field::list("content_filters", "contentFilters", &CONTENT_FILTER),
        Field::string("use_fortiguard_filters", "useFortiguardFilters").check(ENABLE_DISABLE),
        Field::string("block_invalid_url", "blockInvalidUrl").check(ENABLE_DISABLE),
        Field::string("enforce_safe_search", "enforceSafeSearch").check(ENABLE_DISABLE),
        Field::string("traffic_on_rating_error", "trafficOnRatingError")
            .check(Check::OneOf(&["allow", "block"])),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

const DNS_CATEGORY_FILTER: FieldKind = FieldKind::Object(DNS_CATEGORY_FILTER_FIELDS);
const DNS_CATEGORY_FILTER_FIELDS: &[Field] = &[
    Field::reference("category", "category"),
    Field::string("action", "action").check(FILTER_ACTION),
];

pub static DNS_FILTER_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_dns_filter_profile",
    description: "DNS filtering by FortiGuard category and threat feed",
    path: "/resource-api/v1/security/{direction}/dns-filter-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::list("fortiguard_filters", "fortiguardFilters", &DNS_CATEGORY_FILTER),
        Field::list(
            "domain_threat_feed_filters",
            "domainThreatFeedFilters",
            &DNS_CATEGORY_FILTER,
        ),
        Field::string("use_fortiguard_filters", "useFortiguardFilters").check(ENABLE_DISABLE),
        Field::string("enforce_safe_search", "enforceSafeSearch").check(ENABLE_DISABLE),
        Field::string("allow_dns_requests_on_rating_error", "allowDnsRequestsOnRatingError")
            .check(ENABLE_DISABLE),
        Field::string("log_all_domains", "logAllDomains").check(ENABLE_DISABLE),
        Field::string("include_cname_records", "includeCnameRecords").check(ENABLE_DISABLE),
        Field::string("youtube_restrict", "youtubeRestrict")
            .check(Check::OneOf(&["strict", "moderate", "none"])),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

pub static IPS_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_ips_profile",
    description: "Intrusion prevention",
    path: "/resource-api/v1/security/{direction}/ips-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::string("profile_type", "profileType")
            .check(Check::OneOf(&["recommended", "critical", "monitor", "custom"])),
        Field::string("is_blocking_malicious_url", "isBlockingMaliciousUrl")
            .check(ENABLE_DISABLE),
        Field::string("botnet_scanning", "botnetScanning")
            .check(Check::OneOf(&["disable", "block", "monitor"])),
        Field::string("is_extended_log_enabled", "isExtendedLogEnabled").check(ENABLE_DISABLE),
        Field::references("custom_rule_groups", "customRuleGroups"),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

const FILE_FILTER: FieldKind = FieldKind::Object(FILE_FILTER_FIELDS);
const FILE_FILTER_FIELDS: &[Field] = &[
    Field::string("name", "name"),
    Field::set("protocols", "protocols", &STRING),
    Field::string("action", "action").check(Check::OneOf(&["log", "block"])),
    Field::string("direction", "direction")
        .check(Check::OneOf(&["incoming", "outgoing", "any"])),
    Field::references("file_types", "fileTypes"),
    Field::string("status", "status").check(ENABLE_DISABLE),
];

pub static FILE_FILTER_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_file_filter_profile",
    description: "File filtering by type and protocol",
    path: "/resource-api/v1/security/{direction}/file-filter-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::string("block_high_risk", "blockHighRisk").check(ENABLE_DISABLE),
        Field::list("file_filters", "fileFilters", &FILE_FILTER),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

const APP_CATEGORY_CONTROL: FieldKind = FieldKind::Object(APP_CATEGORY_CONTROL_FIELDS);
const APP_CATEGORY_CONTROL_FIELDS: &[Field] = &[
    Field::reference("category", "category"),
    Field::string("action", "action").check(FILTER_ACTION),
];

const APP_OVERRIDE: FieldKind = FieldKind::Object(APP_OVERRIDE_FIELDS);
const APP_OVERRIDE_FIELDS: &[Field] = &[
    Field::references("applications", "applications"),
    Field::string("action", "action").check(FILTER_ACTION),
];

pub static APP_CONTROL_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_app_control_profile",
    description: "Application control by category with per-application overrides",
    path: "/resource-api/v1/security/{direction}/app-control-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::list(
            "application_category_controls",
            "applicationCategoryControls",
            &APP_CATEGORY_CONTROL,
        ),
        Field::list("application_overrides", "applicationOverrides", &APP_OVERRIDE),
        Field::string("unknown_application_action", "unknownApplicationAction")
            .check(Check::OneOf(&["allow", "monitor", "block"])),
        Field::string("network_protocol_enforcement", "networkProtocolEnforcement")
            .check(ENABLE_DISABLE),
        Field::string("block_non_default_port_applications", "blockNonDefaultPortApplications")
            .check(ENABLE_DISABLE),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

const CERT_ACTION: Check = Check::OneOf(&["allow", "block", "ignore"]);

pub static SSL_SSH_PROFILE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_ssl_ssh_profile",
    description: "SSL/SSH inspection",
    path: "/resource-api/v1/security/{direction}/ssl-ssh-profiles",
    fields: &[
        PRIMARY_KEY,
        Field::string("inspection_mode", "inspectionMode")
            .check(Check::OneOf(&["certificate-inspection", "deep-inspection"])),
        Field::reference("ca_certificate", "caCertificate"),
        Field::string("expired_certificate_action", "expiredCertificateAction").check(CERT_ACTION),
        Field::string("revoked_certificate_action", "revokedCertificateAction").check(CERT_ACTION),
        Field::string("untrusted_certificate_action", "untrustedCertificateAction")
            .check(CERT_ACTION),
        Field::string("timed_out_validation_action", "timedOutValidationAction")
            .check(CERT_ACTION),
        Field::string("quic", "quic").check(Check::OneOf(&["inspect", "bypass", "block"])),
        Field::set("exempted_hosts", "exemptedHosts", &REFERENCE),
        Field::references("exempted_categories", "exemptedCategories"),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: None,
    direction: true,
};

pub static PROFILE_GROUP: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_profile_group",
    description: "Bundle of security profiles applied together by a policy",
    path: "/resource-api/v1/security/{direction}/profile-groups",
    fields: &[
        PRIMARY_KEY,
        Field::reference("antivirus_profile", "antivirusProfile"),
        Field::reference("web_filter_profile", "webFilterProfile"),
        Field::reference("video_filter_profile", "videoFilterProfile"),
        Field::reference("dns_filter_profile", "dnsFilterProfile"),
        Field::reference("file_filter_profile", "fileFilterProfile"),
        Field::reference("dlp_filter_profile", "dlpFilterProfile"),
        Field::reference("intrusion_prevention_profile", "intrusionPreventionProfile"),
        Field::reference("application_control_profile", "applicationControlProfile"),
        Field::reference("ssl_ssh_profile", "sslSshProfile"),
    ],
    create: CreateMode::Upsert,
    delete: DeletePolicy::Forget,
    lock: Some("security-profile-groups"),
    direction: true,
};

// Policies are evaluated in order and the API renumbers them on every
// write, so all policy writes share one lock.

const POLICY_ACTION: Check = Check::OneOf(&["accept", "deny"]);
const LOG_TRAFFIC: Check = Check::OneOf(&["all", "utm", "disable"]);

pub static OUTBOUND_POLICY: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_outbound_policy",
    description: "Firewall policy for traffic leaving to the internet",
    path: "/resource-api/v1/security/outbound-policies",
    fields: &[
        PRIMARY_KEY,
        Field::string("enabled", "enabled").check(ENABLE_DISABLE),
        Field::string("scope", "scope").check(Check::OneOf(&["all", "vpn-user", "edge-device"])),
        Field::references("sources", "sources").check(Check::Size(1, 256)),
        Field::references("users", "users"),
        Field::references("destinations", "destinations").check(Check::Size(1, 256)),
        Field::references("services", "services").check(Check::Size(1, 256)),
        Field::string("action", "action").check(POLICY_ACTION),
        Field::reference("schedule", "schedule"),
        Field::reference("profile_group", "profileGroup"),
        Field::string("log_traffic", "logTraffic").check(LOG_TRAFFIC),
        Field::string("comments", "comments").check(Check::Length(0, 1023)),
        Field::number("policy_id", "policyId")
            .computed()
            .describe("Position assigned by the API"),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: Some("firewall-policies"),
    direction: false,
};

pub static INTERNAL_POLICY: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_internal_policy",
    description: "Firewall policy for traffic between internal networks",
    path: "/resource-api/v1/security/internal-policies",
    fields: &[
        PRIMARY_KEY,
        Field::string("enabled", "enabled").check(ENABLE_DISABLE),
        Field::string("scope", "scope").check(Check::OneOf(&["all", "vpn-user", "edge-device"])),
        Field::references("sources", "sources").check(Check::Size(1, 256)),
        Field::references("destinations", "destinations").check(Check::Size(1, 256)),
        Field::references("services", "services").check(Check::Size(1, 256)),
        Field::string("action", "action").check(POLICY_ACTION),
        Field::reference("schedule", "schedule"),
        Field::reference("profile_group", "profileGroup"),
        Field::string("log_traffic", "logTraffic").check(LOG_TRAFFIC),
        Field::string("comments", "comments").check(Check::Length(0, 1023)),
        Field::number("policy_id", "policyId").computed(),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: Some("firewall-policies"),
    direction: false,
};

const PORT_RANGE: FieldKind = FieldKind::Object(PORT_RANGE_FIELDS);
const PORT_RANGE_FIELDS: &[Field] = &[
    Field::number("destination_port_low", "destinationPortLow").check(Check::Range(0.0, 65535.0)),
    Field::number("destination_port_high", "destinationPortHigh")
        .check(Check::Range(0.0, 65535.0)),
    Field::number("source_port_low", "sourcePortLow").check(Check::Range(0.0, 65535.0)),
    Field::number("source_port_high", "sourcePortHigh").check(Check::Range(0.0, 65535.0)),
];

pub static SERVICE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_security_service",
    description: "Firewall service: protocol and port ranges",
    path: "/resource-api/v1/security/services",
    fields: &[
        PRIMARY_KEY,
        Field::bool("proxy", "proxy").describe("Service applies to explicit proxy traffic"),
        Field::string("protocol", "protocol")
            .check(Check::OneOf(&["TCP/UDP/SCTP", "ICMP", "ICMP6", "IP"])),
        Field::number("protocol_number", "protocolNumber").check(Check::Range(0.0, 254.0)),
        Field::list("tcp_portrange", "tcpPortrange", &PORT_RANGE),
        Field::list("udp_portrange", "udpPortrange", &PORT_RANGE),
        Field::list("sctp_portrange", "sctpPortrange", &PORT_RANGE),
        Field::number("icmp_type", "icmpType").check(Check::Range(0.0, 255.0)),
        Field::number("icmp_code", "icmpCode").check(Check::Range(0.0, 255.0)),
        Field::set("session_ttl_overrides", "sessionTtlOverrides", &NUMBER),
        Field::reference("category", "category"),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: None,
    direction: false,
};
