use super::{CreateMode, DeletePolicy, ResourceDefinition};
use crate::fields::{Check, Field, FieldKind, STRING};

const PRIMARY_KEY: Field = Field::string("primary_key", "primaryKey")
    .required()
    .check(Check::Length(1, 79))
    .describe("Name of the object");

pub static HOST: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_network_host",
    description: "Address object: subnet, IP range or FQDN",
    path: "/resource-api/v1/network/hosts",
    fields: &[
        PRIMARY_KEY,
        Field::string("type", "type").check(Check::OneOf(&[
            "ipmask",
            "iprange",
            "fqdn",
            "geography",
        ])),
        Field::string("subnet", "subnet").describe("Address and mask, e.g. 10.0.0.0 255.0.0.0"),
        Field::string("start_ip", "startIp"),
        Field::string("end_ip", "endIp"),
        Field::string("fqdn", "fqdn"),
        Field::string("country_id", "countryId"),
        Field::string("location", "location")
            .check(Check::OneOf(&["internal", "external", "private-access-network"])),
        Field::string("comments", "comments").check(Check::Length(0, 255)),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: None,
    direction: false,
};

pub static HOST_GROUP: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_network_host_group",
    description: "Named group of address objects",
    path: "/resource-api/v1/network/host-groups",
    fields: &[
        PRIMARY_KEY,
        Field::references("members", "members").check(Check::Size(1, 600)),
        Field::bool("proxy", "proxy"),
        Field::string("comments", "comments").check(Check::Length(0, 255)),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: None,
    direction: false,
};

const POP_DNS: FieldKind = FieldKind::Object(POP_DNS_FIELDS);
const POP_DNS_FIELDS: &[Field] = &[
    Field::string("primary_dns", "primaryDns"),
    Field::string("secondary_dns", "secondaryDns"),
];

// The API assigns DNS rule keys and renumbers the list on every write.
pub static DNS_RULE: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_network_dns_rule",
    description: "Split DNS rule sending matching domains to specific resolvers",
    path: "/resource-api/v1/network/dns-rules",
    fields: &[
        Field::string("primary_key", "primaryKey")
            .computed()
            .describe("Assigned by the API"),
        Field::set("domains", "domains", &STRING)
            .check(Check::Size(1, 256))
            .describe("Domains resolved by this rule; may contain wildcards"),
        Field::string("primary_dns", "primaryDns"),
        Field::string("secondary_dns", "secondaryDns"),
        Field::map("pop_dns_override", "popDnsOverride", &POP_DNS)
            .describe("Resolvers to use instead at specific security PoPs, keyed by PoP name"),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: Some("dns-rules"),
    direction: false,
};

const BGP_ROUTER: FieldKind = FieldKind::Object(BGP_ROUTER_FIELDS);
const BGP_ROUTER_FIELDS: &[Field] = &[
    Field::string("name", "name"),
    Field::string("ip", "ip"),
    Field::number("asn", "asn").check(Check::Range(1.0, 4294967295.0)),
];

pub static PRIVATE_ACCESS_NETWORK_CONFIGURATION: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_private_access_network_configuration",
    description: "Tenant-wide private access network settings",
    path: "/resource-api/v1/private-access/network-configuration",
    fields: &[
        Field::number("bgp_router_ids_subnet_mask", "bgpRouterIdsSubnetMask")
            .check(Check::Range(0.0, 32.0)),
        Field::string("bgp_router_ids_subnet", "bgpRouterIdsSubnet"),
        Field::number("as_number", "as").check(Check::Range(1.0, 4294967295.0)),
        Field::string("recursive_next_hop", "recursiveNextHop")
            .check(Check::OneOf(&["enable", "disable"])),
        Field::string("sdwan_rule_enable", "sdwanRuleEnable")
            .check(Check::OneOf(&["enable", "disable"])),
        Field::string("sdwan_health_check_vm", "sdwanHealthCheckVm"),
        Field::string("config_state", "configState")
            .computed()
            .describe("Provisioning state reported by the API"),
        Field::list("bgp_routers", "bgpRouters", &BGP_ROUTER).computed(),
    ],
    create: CreateMode::Singleton,
    delete: DeletePolicy::Forget,
    lock: Some("private-access-network-config"),
    direction: false,
};
