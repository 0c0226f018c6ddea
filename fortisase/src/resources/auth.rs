use super::{CreateMode, DeletePolicy, ResourceDefinition};
use crate::fields::{Check, Field, FieldKind};

const REMOTE_GROUP: FieldKind = FieldKind::Object(REMOTE_GROUP_FIELDS);
const REMOTE_GROUP_FIELDS: &[Field] = &[
    Field::reference("server", "server").describe("LDAP, RADIUS or SAML server"),
    Field::string("group", "group").describe("Group name as known to the server"),
];

pub static USER_GROUP: ResourceDefinition = ResourceDefinition {
    type_name: "fortisase_auth_user_group",
    description: "Group of local or remote users that policies can match on",
    path: "/resource-api/v1/auth/user-groups",
    fields: &[
        Field::string("primary_key", "primaryKey")
            .required()
            .check(Check::Length(1, 35)),
        Field::string("group_type", "groupType")
            .check(Check::OneOf(&["firewall", "fsso-service"])),
        Field::references("local_users", "localUsers"),
        Field::list("remote_groups", "remoteGroups", &REMOTE_GROUP),
        Field::string("fsso_groups", "fssoGroups").optional(),
    ],
    create: CreateMode::Post,
    delete: DeletePolicy::Remote,
    lock: None,
    direction: false,
};
